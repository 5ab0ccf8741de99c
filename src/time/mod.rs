pub mod clock;
pub mod session;
pub mod ticker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use session::{parse_weekday, MarketSchedule, MarketScheduleCalculator};
pub use ticker::CountdownTicker;
