pub mod session;

pub use session::{
    clear_session, get_user_id_from_session, set_user_session, AuthenticatedUser, MaybeUser,
};
