mod assessment;
mod course;
pub mod decimal;
mod enrollment;
mod ids;
mod notification;
mod payment;
mod sponsorship;
mod user;

pub use ids::{
    AssessmentId, CourseId, EnrollmentId, LessonId, ModuleId, NotificationId, ParseIdError,
    PaymentId, SponsorshipId, SubmissionId, UserId,
};

pub use assessment::{
    Assessment, AssessmentDraft, AssessmentError, AssessmentType, GradeError, GradeInput,
    NewAssessment, NewSubmission, Submission,
};
pub use course::{
    Course, CourseDraft, CourseError, Difficulty, Lesson, LessonDraft, Module, ModuleDraft,
    NewCourse, NewLesson, NewModule,
};
pub use decimal::{DecimalError, Money, Progress, Score};
pub use enrollment::{Enrollment, NewEnrollment};
pub use notification::{NewNotification, Notification, NotificationType, NotificationTypeError};
pub use payment::{CoursePayment, NewPayment, PaymentStatus, PaymentStatusError};
pub use sponsorship::{NewSponsorship, SponsorProfile, Sponsorship, SponsorshipError};
pub use user::{NewUser, User, UserDraft, UserError, UserProfile};
