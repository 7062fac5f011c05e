mod clock;
mod leader;

pub use clock::{Clock, FixedClock, SystemClock};
pub use leader::{LeaderSelector, leader_index};
