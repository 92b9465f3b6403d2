diesel::table! {
    Image (image_id) {
        image_id -> BigInt,
        project_id -> BigInt,
        digest -> Text,
        format_name -> Text,
        path -> Text,
        created_at -> BigInt,
    }
}

diesel::table! {
    PageView (page_view_id) {
        page_view_id -> BigInt,
        page_path -> Text,
        referrer -> Text,
        project_id -> Nullable<BigInt>,
        ip_hash -> Text,
        viewed_at -> BigInt,
    }
}

diesel::table! {
    Project (project_id) {
        project_id -> BigInt,
        title -> Text,
        description -> Text,
        video_embed -> Text,
        date -> BigInt,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    ProjectTag (project_id, tag_id) {
        project_id -> BigInt,
        tag_id -> BigInt,
    }
}

diesel::table! {
    Session (session_id) {
        session_id -> Text,
        user_id -> BigInt,
        created_at -> BigInt,
        expires_at -> BigInt,
    }
}

diesel::table! {
    SiteConfig (site_config_id) {
        site_config_id -> BigInt,
        about_text -> Text,
        contact_info -> Text,
        tracking_code -> Text,
        theme_name -> Text,
        updated_at -> BigInt,
    }
}

diesel::table! {
    Tag (tag_id) {
        tag_id -> BigInt,
        name -> Text,
    }
}

diesel::table! {
    User (user_id) {
        user_id -> BigInt,
        username -> Text,
        password_hash -> Text,
        created_at -> BigInt,
    }
}

diesel::joinable!(Image -> Project (project_id));
diesel::joinable!(PageView -> Project (project_id));
diesel::joinable!(ProjectTag -> Project (project_id));
diesel::joinable!(ProjectTag -> Tag (tag_id));
diesel::joinable!(Session -> User (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    Image,
    PageView,
    Project,
    ProjectTag,
    Session,
    SiteConfig,
    Tag,
    User,
);
