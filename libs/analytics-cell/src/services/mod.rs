pub mod dashboard;

pub use dashboard::AnalyticsService;
