pub mod alerts;
pub mod panel_service;
pub mod poller_service;
pub mod refresh_service;
pub mod telegram_service;
