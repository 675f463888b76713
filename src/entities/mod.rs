//! Entity module - Contains all SeaORM entity definitions for the record store.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod breakfast_photo;
pub mod check_in;
pub mod cohort;
pub mod daily_habit;
pub mod meal_option;
pub mod meal_selection;
pub mod profile;
pub mod streak;
pub mod weekly_exercise;

// Re-export specific types to avoid conflicts
pub use breakfast_photo::{
    Column as BreakfastPhotoColumn, Entity as BreakfastPhoto, Model as BreakfastPhotoModel,
};
pub use check_in::{Column as CheckInColumn, Entity as CheckIn, Model as CheckInModel};
pub use cohort::{Column as CohortColumn, Entity as Cohort, Model as CohortModel};
pub use daily_habit::{
    Column as DailyHabitColumn, Entity as DailyHabit, Model as DailyHabitModel,
};
pub use meal_option::{Column as MealOptionColumn, Entity as MealOption, Model as MealOptionModel};
pub use meal_selection::{
    Column as MealSelectionColumn, Entity as MealSelection, Model as MealSelectionModel,
};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};
pub use streak::{Column as StreakColumn, Entity as Streak, Model as StreakModel};
pub use weekly_exercise::{
    Column as WeeklyExerciseColumn, Entity as WeeklyExercise, Model as WeeklyExerciseModel,
};
