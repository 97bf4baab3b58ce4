mod client;

pub use client::TankApiClient;
