/// Database row types. These map directly to SQLite rows and are kept
/// distinct from the stormbrainer-types wire models.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub rating: i64,
    pub created_at: String,
}

/// A galaxy as seen by one viewer: `is_member` is relative to that viewer.
pub struct GalaxyRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_public: bool,
    pub password_hash: Option<String>,
    pub owner_id: i64,
    pub owner_username: String,
    pub member_count: i64,
    pub is_member: bool,
    pub created_at: String,
}

pub struct NewGalaxy<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub is_public: bool,
    pub password_hash: Option<&'a str>,
    pub owner_id: i64,
}

pub struct ProblemRow {
    pub id: i64,
    pub galaxy_id: i64,
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub creator_username: String,
    pub stars: i64,
    pub solution_count: i64,
    pub created_at: String,
}

pub struct SolutionRow {
    pub id: i64,
    pub problem_id: i64,
    pub galaxy_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub stars: i64,
    pub created_at: String,
}

pub struct LeaderboardRow {
    pub id: i64,
    pub username: String,
    pub rating: i64,
}
