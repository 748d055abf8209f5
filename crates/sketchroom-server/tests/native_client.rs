//! Desktop sessions talking to a live relay through `NativeWebSocket`.

use kurbo::Point;
use sketchroom_core::input::{MouseButton, PointerEvent};
use sketchroom_core::stroke::{History, Segment, Stroke};
use sketchroom_core::{NativeWebSocket, RoomName, Session};
use sketchroom_server::{AppState, serve};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

struct Client {
    session: Session,
    socket: NativeWebSocket,
}

impl Client {
    fn join(addr: SocketAddr, room: &str) -> Self {
        let mut socket = NativeWebSocket::new();
        socket.connect(&format!("ws://{}/ws", addr)).unwrap();
        let mut client = Self {
            session: Session::new(RoomName::parse(room).unwrap()),
            socket,
        };
        client.pump_until(|session| session.collaboration().is_connected());
        client
    }

    fn pump(&mut self) {
        self.session.pump(&mut self.socket);
    }

    /// Pump the session until `done` holds, failing after five seconds.
    fn pump_until(&mut self, done: impl Fn(&Session) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            self.pump();
            if done(&self.session) {
                return;
            }
            assert!(Instant::now() < deadline, "timed out pumping the session");
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn draw(&mut self, from: Point, to: Point) {
        self.session.handle_pointer_event(PointerEvent::Down {
            position: from,
            button: MouseButton::Left,
        });
        self.session.handle_pointer_event(PointerEvent::Move { position: to });
        self.session.handle_pointer_event(PointerEvent::Up {
            position: to,
            button: MouseButton::Left,
        });
        self.pump();
    }

    fn history(&self) -> &History {
        self.session.canvas().document.history()
    }
}

fn start_server() -> (Runtime, SocketAddr) {
    let runtime = Runtime::new().unwrap();
    let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0")).unwrap();
    let addr = listener.local_addr().unwrap();
    runtime.spawn(serve(listener, Arc::new(AppState::new())));
    (runtime, addr)
}

fn stroke(x0: f64, y0: f64, x1: f64, y1: f64) -> Stroke {
    Stroke::new(vec![Segment { x0, y0, x1, y1 }]).unwrap()
}

#[test]
fn test_sessions_share_history() {
    let (_runtime, addr) = start_server();

    let mut alice = Client::join(addr, "lobby");
    alice.draw(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
    let first = History::from(vec![stroke(0.0, 0.0, 1.0, 1.0)]);
    assert_eq!(alice.history(), &first);

    // Bob sees Alice's stroke either as the join snapshot or as a relay.
    let mut bob = Client::join(addr, "lobby");
    bob.pump_until(|session| session.canvas().document.history() == &first);

    bob.draw(Point::new(2.0, 3.0), Point::new(4.0, 5.0));
    let both = History::from(vec![stroke(0.0, 0.0, 1.0, 1.0), stroke(2.0, 3.0, 4.0, 5.0)]);
    alice.pump_until(|session| session.canvas().document.history() == &both);
    assert!(!alice.session.canvas().document.can_undo());

    let mut carol = Client::join(addr, "lobby");
    carol.pump_until(|session| session.canvas().document.history() == &both);
}

#[test]
fn test_rooms_are_isolated() {
    let (_runtime, addr) = start_server();

    let mut alice = Client::join(addr, "lobby");
    let mut dave = Client::join(addr, "attic");
    alice.draw(Point::new(0.0, 0.0), Point::new(1.0, 1.0));

    // A later joiner of Alice's room proves her frame has been relayed.
    let mut bob = Client::join(addr, "lobby");
    bob.pump_until(|session| !session.canvas().document.history().is_empty());

    thread::sleep(Duration::from_millis(100));
    dave.pump();
    assert!(dave.history().is_empty());
}

#[test]
fn test_server_shutdown_disconnects_session() {
    let (runtime, addr) = start_server();
    let mut alice = Client::join(addr, "lobby");

    drop(runtime);
    alice.pump_until(|session| !session.collaboration().is_connected());

    // Strokes drawn while disconnected stay local.
    alice.draw(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
    assert_eq!(alice.history().len(), 1);
    assert!(!alice.session.collaboration().has_outgoing());
}
