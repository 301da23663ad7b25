// Drives an application level state machine from the events of a live
// client, the way a front end reacting to a portal would.

#[path = "../common/mod.rs"]
mod common;

use common::{WAIT, fixtures};
use libportal::fsm::{FsmError, State, StateMachine};
use libportal::test_support::{PowerSavesSim, sample_token};
use libportal::{Command, EventName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
enum Screen {
    #[default]
    Start,
    Waiting,
    Loaded,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Input {
    Boot,
    Token,
    Gone,
    Save,
    Saved,
}

#[derive(Default)]
struct Ui {
    image: Option<Vec<u8>>,
    entered: Vec<Screen>,
}

fn screens() -> StateMachine<Screen, Input, Ui> {
    StateMachine::new([
        (Screen::Start, State::new().on(Input::Boot, Screen::Waiting)),
        (
            Screen::Waiting,
            State::new()
                .with_action(|ui: &mut Ui| {
                    ui.entered.push(Screen::Waiting);
                    ui.image = None;
                    None
                })
                .on(Input::Token, Screen::Loaded),
        ),
        (
            Screen::Loaded,
            State::new()
                .with_action(|ui: &mut Ui| {
                    ui.entered.push(Screen::Loaded);
                    None
                })
                .on(Input::Save, Screen::Saving)
                .on(Input::Gone, Screen::Waiting),
        ),
        (
            Screen::Saving,
            State::new()
                .with_action(|ui: &mut Ui| {
                    ui.entered.push(Screen::Saving);
                    None
                })
                .on(Input::Saved, Screen::Loaded)
                .on(Input::Gone, Screen::Waiting),
        ),
    ])
    .unwrap()
}

#[test]
fn screens_follow_portal_events() {
    let sim = PowerSavesSim::with_token(sample_token());
    let mut client = fixtures::powersaves_client(&sim, true);
    let mut events = client.events().unwrap();
    let fsm = screens();
    let mut ui = Ui::default();
    fsm.init(&mut ui).unwrap();

    let deadline = std::time::Instant::now() + WAIT;
    let mut saved = false;
    while fsm.current() != Screen::Waiting || !saved {
        assert!(std::time::Instant::now() < deadline, "stuck in {:?}", fsm.current());
        let Ok(event) = events.try_recv() else {
            std::thread::sleep(std::time::Duration::from_millis(2));
            continue;
        };
        match event.name() {
            EventName::TokenTagData => {
                ui.image = Some(event.into_payload());
                fsm.send_event(Input::Token, &mut ui).unwrap();
                fsm.send_event(Input::Save, &mut ui).unwrap();
                client.send_command(Command::write_token(sample_token())).unwrap();
            }
            EventName::TokenTagWriteFinish => {
                fsm.send_event(Input::Saved, &mut ui).unwrap();
                saved = true;
                sim.remove_token();
            }
            EventName::TokenRemoved => {
                fsm.send_event(Input::Gone, &mut ui).unwrap();
            }
            _ => {}
        }
    }

    assert_eq!(
        ui.entered,
        vec![
            Screen::Waiting,
            Screen::Loaded,
            Screen::Saving,
            Screen::Loaded,
            Screen::Waiting
        ]
    );
    assert!(ui.image.is_none());
    assert_eq!(fsm.previous(), Some(Screen::Loaded));
    client.disconnect().unwrap();
}

#[test]
fn out_of_order_event_is_rejected() {
    let fsm = screens();
    let mut ui = Ui::default();
    fsm.init(&mut ui).unwrap();
    assert!(matches!(
        fsm.send_event(Input::Saved, &mut ui),
        Err(FsmError::EventRejected { .. })
    ));
    assert_eq!(fsm.current(), Screen::Waiting);
}
