mod account;

pub use account::account_me;
