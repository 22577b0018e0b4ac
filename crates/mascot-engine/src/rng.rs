// rng.rs
//
// Landing-spot picker for transition flights. A tiny xorshift64 state is
// enough entropy for choosing corners; keeping it seedable means tests can
// replay an exact flight sequence while production seeds from the clock.

/// A flight lands on one of this many corner candidates.
pub const CORNER_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            // xorshift locks up on an all-zero state.
            state: if seed == 0 { 0x4a75_6265 } else { seed },
        }
    }

    fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Index of the corner the next flight lands on, in `0..CORNER_COUNT`.
    pub fn pick_corner(&mut self) -> usize {
        (self.step() % CORNER_COUNT as u64) as usize
    }
}
