pub mod evaluate;
pub mod inspect;
pub mod stats;
