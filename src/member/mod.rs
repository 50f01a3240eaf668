//! Member form pipeline: normalize, validate, call the member API, dispatch.

pub mod actions;
pub mod client;
pub mod errors;
pub mod form;
pub mod schema;
pub mod session;
pub mod validate;

pub use self::actions::{
    fetch_user_info, process_join, process_login, ActionOutcome, Redirect, RedirectMode,
    RedirectParams,
};
pub use self::client::{Credentials, JoinReply, LoginReply, MemberApi};
pub use self::errors::{ActionError, ErrorKind, ErrorMap};
pub use self::form::{normalize, FieldValue, SubmittedForm};
pub use self::schema::{FieldKind, FieldSpec, FormSchema, JOIN_FORM, LOGIN_FORM};
pub use self::session::{CookieJar, SameSite, SessionCookie, SessionStore, SessionToken};
pub use self::validate::validate;
