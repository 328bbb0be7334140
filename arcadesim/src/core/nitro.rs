use serde::Deserialize;

/// * `boost_duration` - (ms) Duration of a nitro boost
/// * `cooldown_duration` - (ms) Duration of the cooldown after a boost ended
/// * `boost_speed` - Speed the vehicle is pinned to while boosting
/// * `ai_max_initial_cooldown` - (ms) AI vehicles start with a random cooldown in [0, value)
/// * `ai_activation_prob` - Per-frame probability that an AI vehicle activates its boost on a
/// straight
/// * `ai_straight_threshold` - (rad) Heading error below which an AI vehicle considers itself to
/// be on a straight
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NitroPars {
    pub boost_duration: f64,
    pub cooldown_duration: f64,
    pub boost_speed: f64,
    pub ai_max_initial_cooldown: f64,
    pub ai_activation_prob: f64,
    pub ai_straight_threshold: f64,
}

impl Default for NitroPars {
    fn default() -> Self {
        NitroPars {
            boost_duration: 10000.0,
            cooldown_duration: 30000.0,
            boost_speed: 200.0,
            ai_max_initial_cooldown: 10000.0,
            ai_activation_prob: 0.02,
            ai_straight_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NitroState {
    Ready,
    Boosting { ends_at: f64 },
    Cooldown { ends_at: f64 },
}

/// Nitro is the boost state machine of a vehicle: Ready -> Boosting on activation, Boosting ->
/// Cooldown and Cooldown -> Ready automatically when the respective deadline on the simulation
/// clock is reached.
#[derive(Debug, Clone)]
pub struct Nitro {
    pub state: NitroState,
    boost_duration: f64,
    cooldown_duration: f64,
    pub boost_speed: f64,
}

impl Nitro {
    pub fn new(nitro_pars: &NitroPars) -> Nitro {
        Nitro {
            state: NitroState::Ready,
            boost_duration: nitro_pars.boost_duration,
            cooldown_duration: nitro_pars.cooldown_duration,
            boost_speed: nitro_pars.boost_speed,
        }
    }

    /// with_cooldown creates a nitro that is locked until the inserted point in time.
    pub fn with_cooldown(nitro_pars: &NitroPars, ends_at: f64) -> Nitro {
        let mut nitro = Nitro::new(nitro_pars);
        nitro.state = NitroState::Cooldown { ends_at };
        nitro
    }

    /// The method performs the automatic state transitions. It returns true if a boost ended in
    /// this call.
    pub fn update(&mut self, now: f64) -> bool {
        match self.state {
            NitroState::Boosting { ends_at } if now >= ends_at => {
                self.state = NitroState::Cooldown {
                    ends_at: now + self.cooldown_duration,
                };
                true
            }
            NitroState::Cooldown { ends_at } if now >= ends_at => {
                self.state = NitroState::Ready;
                false
            }
            _ => false,
        }
    }

    /// The method starts a boost if the nitro is ready. It returns true if a boost was started.
    pub fn try_activate(&mut self, now: f64) -> bool {
        self.update(now);

        if self.state == NitroState::Ready {
            self.state = NitroState::Boosting {
                ends_at: now + self.boost_duration,
            };
            true
        } else {
            false
        }
    }

    pub fn is_boosting(&self) -> bool {
        matches!(self.state, NitroState::Boosting { .. })
    }

    pub fn is_ready(&self) -> bool {
        self.state == NitroState::Ready
    }

    /// bar returns the fill level of the nitro bar in [0, 100]: full when ready, the remaining
    /// boost time while boosting, and the refill progress during cooldown.
    pub fn bar(&self, now: f64) -> f64 {
        let frac = match self.state {
            NitroState::Ready => 1.0,
            NitroState::Boosting { ends_at } => (ends_at - now) / self.boost_duration,
            NitroState::Cooldown { ends_at } => 1.0 - (ends_at - now) / self.cooldown_duration,
        };
        (frac * 100.0).clamp(0.0, 100.0)
    }
}
