pub mod accounts;
pub mod advertisements;
pub mod app_config;
pub mod bookmarks;
pub mod comments;
pub mod constants;
pub mod content;
pub mod conversations;
pub mod db;
pub mod feedback;
pub mod forms;
pub mod ip;
pub mod listing;
pub mod middleware;
pub mod openmics;
pub mod orm;
pub mod profiles;
pub mod rate_limit;
pub mod reports;
pub mod session;
pub mod storage;
pub mod taxonomy;
pub mod template;
pub mod web;
