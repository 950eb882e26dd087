pub mod cache {

    pub const DEFAULT_TTL_SECONDS: u64 = 300;

    pub const SEARCH_NAMESPACE: &str = "search";

    pub const CHAT_NAMESPACE: &str = "chat";
}

pub mod messages {

    pub const MISSING_CONTENT: &str = "No content available";

    pub const TITLE_MAX_CHARS: usize = 60;

    pub const SNIPPET_MAX_CHARS: usize = 200;
}

pub mod limits {

    pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

    pub const MAX_SEARCH_LIMIT: u32 = 100;

    pub const CHAT_CITATION_LIMIT: u32 = 5;
}
