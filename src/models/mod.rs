pub mod input;
pub mod post;
pub mod task;
pub mod user;

pub use post::{NewPost, Post, PostInput, PostUpdate};
pub use task::{NewTask, Task, TaskInput, TaskUpdate};
pub use user::{Credentials, NewUser, User};
