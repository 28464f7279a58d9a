// Export all route modules
pub mod announcements;
pub mod system;
pub mod wechat;
