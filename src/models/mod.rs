pub mod article;
pub mod comment;
pub mod like;
pub mod question;
pub mod user;

pub use article::{Entity as Article, Model as ArticleModel};
pub use comment::{Entity as Comment, Model as CommentModel};
pub use like::{Entity as Like, LikeTarget};
pub use question::{Entity as Question, Model as QuestionModel};
pub use user::{Entity as User, Model as UserModel};
