use arcadesim::core::controller::InputState;
use arcadesim::interfaces::gui_interface::RaceState;
use flume::{Receiver, Sender};

#[derive(Debug)]
pub struct ArcadesimInterface {
    pub rx: Receiver<RaceState>,
    pub tx_input: Sender<InputState>,
    pub race_state: RaceState,
    last_input: InputState,
}

impl ArcadesimInterface {
    pub fn new(rx: Receiver<RaceState>, tx_input: Sender<InputState>) -> ArcadesimInterface {
        ArcadesimInterface {
            rx,
            tx_input,
            race_state: Default::default(),
            last_input: Default::default(),
        }
    }

    pub fn update(&mut self) {
        // obtain the latest race state in the channel, older ones are outdated
        if let Some(race_state) = self.rx.try_iter().last() {
            self.race_state = race_state;

            // sort vehicle states by id to make sure the drawing does not flicker
            self.race_state.vehicle_states.sort_by_key(|veh| veh.id);
        }
    }

    /// send_input forwards the pressed-key set to the simulation if it changed. Sending fails only
    /// once the simulation thread has ended, in which case the GUI keeps showing the final state.
    pub fn send_input(&mut self, input: InputState) {
        if input != self.last_input && self.tx_input.send(input.clone()).is_ok() {
            self.last_input = input;
        }
    }
}
