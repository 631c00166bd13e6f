pub mod booking;
pub mod conflict;
pub mod locks;
pub mod lookup;

pub use booking::BookingService;
pub use lookup::BookingQueryService;
