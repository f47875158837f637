//! Diesel table definitions.
//!
//! Must match `backend/migrations`; regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// One row per recipient of a notification.
    notifications (id) {
        id -> Uuid,
        /// Recipient; references the identity store's `auth.users`.
        user_id -> Uuid,
        title -> Text,
        message -> Text,
        #[sql_name = "type"]
        kind -> Text,
        /// Caller metadata plus `audience`, `target_role` and `sent_at`.
        metadata -> Jsonb,
        read -> Bool,
        created_at -> Timestamptz,
    }
}
