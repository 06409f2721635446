use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                rating          INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE galaxies (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                description     TEXT,
                category        TEXT NOT NULL,
                is_public       INTEGER NOT NULL,
                password_hash   TEXT,
                owner_id        INTEGER NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                CHECK (is_public = 1 OR password_hash IS NOT NULL)
            );

            CREATE TABLE galaxy_members (
                galaxy_id       INTEGER NOT NULL REFERENCES galaxies(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                joined_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (galaxy_id, user_id)
            );

            CREATE TABLE problems (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                galaxy_id       INTEGER NOT NULL REFERENCES galaxies(id),
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                creator_id      INTEGER NOT NULL REFERENCES users(id),
                stars           INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_problems_galaxy ON problems(galaxy_id, created_at);

            CREATE TABLE solutions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                problem_id      INTEGER NOT NULL REFERENCES problems(id),
                author_id       INTEGER NOT NULL REFERENCES users(id),
                text            TEXT NOT NULL,
                stars           INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_solutions_problem ON solutions(problem_id, stars);

            CREATE TABLE ratings (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                solution_id     INTEGER NOT NULL REFERENCES solutions(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                value           INTEGER NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE (solution_id, user_id)
            );

            CREATE INDEX idx_users_rating ON users(rating DESC, id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_rerunnable() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn private_galaxy_requires_password_hash() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('a', 'a@x.com', 'h')",
            [],
        )
        .unwrap();

        let res = conn.execute(
            "INSERT INTO galaxies (name, category, is_public, password_hash, owner_id)
             VALUES ('g', 'Math', 0, NULL, 1)",
            [],
        );
        assert!(res.is_err());
    }
}
