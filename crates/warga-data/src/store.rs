use crate::{
    Delete, Insert, LoginAttempt, LoginAttemptFilter, ModifyAccount, Payment, PaymentFilter,
    Query, Retrieve, Template, TemplateFilter, Update, User, UserFilter,
};

/// Everything a storage backend provides. Implemented for
/// any type carrying all of the operations.
pub trait Store:
    Query<User, Filter = UserFilter>
    + Retrieve<User, Key = u32>
    + Insert<User>
    + Update<User>
    + Delete<User>
    + ModifyAccount
    + Query<Payment, Filter = PaymentFilter>
    + Retrieve<Payment, Key = u32>
    + Insert<Payment>
    + Update<Payment>
    + Delete<Payment>
    + Query<LoginAttempt, Filter = LoginAttemptFilter>
    + Insert<LoginAttempt>
    + Query<Template, Filter = TemplateFilter>
    + Retrieve<Template, Key = u32>
    + Insert<Template>
    + Delete<Template>
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: Query<User, Filter = UserFilter>
        + Retrieve<User, Key = u32>
        + Insert<User>
        + Update<User>
        + Delete<User>
        + ModifyAccount
        + Query<Payment, Filter = PaymentFilter>
        + Retrieve<Payment, Key = u32>
        + Insert<Payment>
        + Update<Payment>
        + Delete<Payment>
        + Query<LoginAttempt, Filter = LoginAttemptFilter>
        + Insert<LoginAttempt>
        + Query<Template, Filter = TemplateFilter>
        + Retrieve<Template, Key = u32>
        + Insert<Template>
        + Delete<Template>
        + Send
        + Sync
{
}
