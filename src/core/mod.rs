/// Which meal weeks a user may open and navigate to
pub mod access;
/// Challenge status and timeline for a cohort
pub mod challenge;
/// Injectable time source
pub mod clock;
/// Periodic deadline countdown
pub mod countdown;
/// Challenge calendar arithmetic and deadline formatting
pub mod dates;
/// Dashboard gating on meal selection
pub mod gating;
/// Daily habits, check-ins, streaks, weekly exercise and breakfast photos
pub mod habits;
/// Meal options, weekly selections and week status
pub mod meals;
