pub mod application_bans;
pub mod categories;
pub mod constants;
pub mod giveaways;
pub mod tickets;
