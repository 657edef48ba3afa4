pub mod audit;
pub mod author;
pub mod notification;
pub mod reviewer;
pub mod submission;
