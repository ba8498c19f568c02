pub mod assignment;
pub mod course;
pub mod extension;
pub mod grade;
pub mod ids;
pub mod index;
pub mod question;
pub mod roster;
pub mod submission;

pub use assignment::Assignment;
pub use course::{Course, CourseRole, CourseSplit};
pub use extension::{Extension, ExtensionStudent};
pub use grade::Grade;
pub use ids::{AssignmentId, CourseId, MembershipId, QuestionId, SubmissionId, UserId};
pub use index::{EntityIndex, Indexed};
pub use question::{Question, QuestionKind};
pub use roster::{MemberRole, NewMember, RosterMember};
pub use submission::{QuestionScore, Submission, SubmissionDetail, SubmissionStatus, Submitter};
