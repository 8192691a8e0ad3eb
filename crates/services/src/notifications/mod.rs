//! Email + in-app notifications for course events.

mod dispatcher;
mod mail;
mod service;
mod templates;

pub use dispatcher::{Attempt, DispatchReport, Notice, NotificationDispatcher};
pub use mail::{ConsoleMailer, HttpMailer, Mailer, OutgoingMail};
pub use service::{
    MarkReadResponse, NotificationService, RequestMethod, UNREAD_PREVIEW_LIMIT, UnreadSummary,
};
pub use templates::{EmailTemplates, RenderedBody};
