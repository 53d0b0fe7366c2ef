//! Diesel schema for board persistence.

diesel::table! {
    /// User directory consulted for username lookups.
    users (id) {
        /// User identifier issued by the identity layer.
        id -> Uuid,
        /// Display name; unique ignoring case.
        username -> Text,
    }
}

diesel::table! {
    /// Projects and their position in the owner's list.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Project name.
        name -> Text,
        /// Free-form description.
        description -> Text,
        /// Creating user.
        owner_id -> Uuid,
        /// Position in the owner's project list.
        sort_index -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Access grants keyed by (project, user).
    projects_members (project_id, user_id) {
        /// Project the grant belongs to.
        project_id -> Uuid,
        /// Member.
        user_id -> Uuid,
        /// Username captured when the membership was created.
        username -> Text,
        /// Granted role.
        role_key -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks ordered densely within (project, status).
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Task title.
        title -> Text,
        /// Free-form details.
        details -> Text,
        /// Bucket name.
        status -> Text,
        /// Position within the bucket.
        sort_index -> Int4,
        /// Optional assignee.
        assignee_id -> Nullable<Uuid>,
        /// Effort estimate.
        difficulty -> Int2,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Invitations addressed to users by project members.
    project_invites (id) {
        /// Invitation identifier.
        id -> Uuid,
        /// Target project.
        project_id -> Uuid,
        /// Sending member.
        inviter_id -> Uuid,
        /// Addressed user.
        invitee_id -> Uuid,
        /// Role granted on acceptance.
        role_key -> Text,
        /// Lifecycle status.
        status -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// When the invitee answered.
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(projects_members -> projects (project_id));
diesel::joinable!(tasks -> projects (project_id));
diesel::joinable!(project_invites -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    projects_members,
    tasks,
    project_invites,
);
