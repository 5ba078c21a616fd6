pub mod event;
pub mod feed_item;
pub mod participant;
