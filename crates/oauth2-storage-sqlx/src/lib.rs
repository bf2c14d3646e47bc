mod store;

pub use store::SqlxAccessTokenStore;
