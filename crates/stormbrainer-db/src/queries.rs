use crate::Database;
use crate::models::{GalaxyRow, LeaderboardRow, NewGalaxy, ProblemRow, SolutionRow, UserRow};
use anyhow::{Result, anyhow, bail};
use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use stormbrainer_types::models::GalaxyFilter;
use tracing::{debug, info};

/// Every rating event is a single +1 star.
pub const STAR_VALUE: i64 = 1;

/// Result of a rating attempt.
pub enum RateOutcome {
    /// The rating was recorded; carries the updated solution.
    Rated(SolutionRow),
    /// The rater already has a rating row for this solution. Nothing changed.
    AlreadyRated,
    SolutionNotFound,
}

impl Database {
    // -- Users --

    /// Insert a new user. Returns `None` if the username or email is already taken.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Galaxies --

    /// Create a galaxy and enroll its owner as the first member in one transaction.
    pub fn create_galaxy(&self, galaxy: &NewGalaxy<'_>) -> Result<GalaxyRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO galaxies (name, description, category, is_public, password_hash, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    galaxy.name,
                    galaxy.description,
                    galaxy.category,
                    galaxy.is_public,
                    galaxy.password_hash,
                    galaxy.owner_id,
                ],
            )?;
            let galaxy_id = tx.last_insert_rowid();

            tx.execute(
                "INSERT INTO galaxy_members (galaxy_id, user_id) VALUES (?1, ?2)",
                (galaxy_id, galaxy.owner_id),
            )?;

            let row = query_galaxy(&tx, galaxy_id, galaxy.owner_id)?
                .ok_or_else(|| anyhow!("Galaxy {} vanished after insert", galaxy_id))?;

            tx.commit()?;
            Ok(row)
        })
    }

    /// Look up a galaxy, computing `is_member` for `viewer_id`.
    pub fn get_galaxy(&self, galaxy_id: i64, viewer_id: i64) -> Result<Option<GalaxyRow>> {
        self.with_conn(|conn| query_galaxy(conn, galaxy_id, viewer_id))
    }

    pub fn list_galaxies(&self, viewer_id: i64, filter: GalaxyFilter) -> Result<Vec<GalaxyRow>> {
        self.with_conn(|conn| query_galaxies(conn, viewer_id, filter))
    }

    pub fn is_member(&self, galaxy_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| query_is_member(conn, galaxy_id, user_id))
    }

    /// Add a membership row. Returns false if the user was already a member.
    pub fn add_member(&self, galaxy_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO galaxy_members (galaxy_id, user_id) VALUES (?1, ?2)",
                (galaxy_id, user_id),
            )?;
            Ok(changed == 1)
        })
    }

    // -- Problems --

    pub fn create_problem(
        &self,
        galaxy_id: i64,
        creator_id: i64,
        title: &str,
        description: &str,
    ) -> Result<ProblemRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO problems (galaxy_id, title, description, creator_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![galaxy_id, title, description, creator_id],
            )?;
            let id = conn.last_insert_rowid();
            query_problem(conn, id)?.ok_or_else(|| anyhow!("Problem {} vanished after insert", id))
        })
    }

    pub fn get_problem(&self, problem_id: i64) -> Result<Option<ProblemRow>> {
        self.with_conn(|conn| query_problem(conn, problem_id))
    }

    /// Problems of a galaxy, newest first.
    pub fn list_problems(&self, galaxy_id: i64) -> Result<Vec<ProblemRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE p.galaxy_id = ?1 ORDER BY p.created_at DESC, p.id DESC",
                PROBLEM_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([galaxy_id], map_problem)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Solutions --

    pub fn create_solution(&self, problem_id: i64, author_id: i64, text: &str) -> Result<SolutionRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO solutions (problem_id, author_id, text) VALUES (?1, ?2, ?3)",
                rusqlite::params![problem_id, author_id, text],
            )?;
            let id = conn.last_insert_rowid();
            query_solution(conn, id)?.ok_or_else(|| anyhow!("Solution {} vanished after insert", id))
        })
    }

    pub fn get_solution(&self, solution_id: i64) -> Result<Option<SolutionRow>> {
        self.with_conn(|conn| query_solution(conn, solution_id))
    }

    /// Solutions of a problem: most stars first, earliest submission first among equals.
    pub fn list_solutions(&self, problem_id: i64) -> Result<Vec<SolutionRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE s.problem_id = ?1 ORDER BY s.stars DESC, s.created_at ASC, s.id ASC",
                SOLUTION_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([problem_id], map_solution)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Ratings --

    /// Award one star from `rater_id` to a solution.
    ///
    /// The rating row, the solution's star count and the author's global rating
    /// are written in a single IMMEDIATE transaction. Any failure rolls back all
    /// three. A duplicate is detected both by the existence check and by the
    /// `UNIQUE (solution_id, user_id)` constraint, so concurrent double
    /// submissions still record at most one row.
    pub fn rate_solution(&self, solution_id: i64, rater_id: i64) -> Result<RateOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let exists: Option<i64> = tx
                .query_row("SELECT id FROM solutions WHERE id = ?1", [solution_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Ok(RateOutcome::SolutionNotFound);
            }

            let already: Option<i64> = tx
                .query_row(
                    "SELECT id FROM ratings WHERE solution_id = ?1 AND user_id = ?2",
                    (solution_id, rater_id),
                    |row| row.get(0),
                )
                .optional()?;
            if already.is_some() {
                return Ok(RateOutcome::AlreadyRated);
            }

            match tx.execute(
                "INSERT INTO ratings (solution_id, user_id, value) VALUES (?1, ?2, ?3)",
                (solution_id, rater_id, STAR_VALUE),
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(RateOutcome::AlreadyRated),
                Err(e) => return Err(e.into()),
            }

            let (author_id, stars): (i64, i64) = tx
                .query_row(
                    "UPDATE solutions SET stars = stars + ?1 WHERE id = ?2 RETURNING author_id, stars",
                    (STAR_VALUE, solution_id),
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or_else(|| anyhow!("Solution {} disappeared mid-rating", solution_id))?;

            let bumped = tx.execute(
                "UPDATE users SET rating = rating + ?1 WHERE id = ?2",
                (STAR_VALUE, author_id),
            )?;
            if bumped != 1 {
                bail!("Author {} of solution {} not found", author_id, solution_id);
            }

            let row = query_solution(&tx, solution_id)?
                .ok_or_else(|| anyhow!("Solution {} disappeared mid-rating", solution_id))?;

            tx.commit()?;

            info!(solution_id, rater_id, author_id, stars, "Solution rated");
            Ok(RateOutcome::Rated(row))
        })
    }

    // -- Leaderboard --

    /// Top users by rating. Equal ratings are ordered by ascending user id.
    pub fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, rating FROM users ORDER BY rating DESC, id ASC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(LeaderboardRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        rating: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            debug!("Leaderboard query returned {} rows", rows.len());
            Ok(rows)
        })
    }
}

const USER_SELECT: &str =
    "SELECT id, username, email, password_hash, rating, created_at FROM users";

const GALAXY_SELECT: &str = "
    SELECT g.id, g.name, g.description, g.category, g.is_public, g.password_hash, g.owner_id,
           u.username,
           (SELECT COUNT(*) FROM galaxy_members m WHERE m.galaxy_id = g.id),
           EXISTS (SELECT 1 FROM galaxy_members m WHERE m.galaxy_id = g.id AND m.user_id = ?1),
           g.created_at
    FROM galaxies g
    JOIN users u ON u.id = g.owner_id";

const PROBLEM_SELECT: &str = "
    SELECT p.id, p.galaxy_id, p.title, p.description, p.creator_id, u.username, p.stars,
           (SELECT COUNT(*) FROM solutions s WHERE s.problem_id = p.id),
           p.created_at
    FROM problems p
    JOIN users u ON u.id = p.creator_id";

const SOLUTION_SELECT: &str = "
    SELECT s.id, s.problem_id, p.galaxy_id, s.author_id, u.username, s.text, s.stars, s.created_at
    FROM solutions s
    JOIN problems p ON p.id = s.problem_id
    JOIN users u ON u.id = s.author_id";

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        rating: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_galaxy(row: &rusqlite::Row<'_>) -> rusqlite::Result<GalaxyRow> {
    Ok(GalaxyRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        is_public: row.get(4)?,
        password_hash: row.get(5)?,
        owner_id: row.get(6)?,
        owner_username: row.get(7)?,
        member_count: row.get(8)?,
        is_member: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn map_problem(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProblemRow> {
    Ok(ProblemRow {
        id: row.get(0)?,
        galaxy_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        creator_id: row.get(4)?,
        creator_username: row.get(5)?,
        stars: row.get(6)?,
        solution_count: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn map_solution(row: &rusqlite::Row<'_>) -> rusqlite::Result<SolutionRow> {
    Ok(SolutionRow {
        id: row.get(0)?,
        problem_id: row.get(1)?,
        galaxy_id: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
        text: row.get(5)?,
        stars: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let sql = format!("{} WHERE email = ?1", USER_SELECT);
    let row = conn.query_row(&sql, [email], map_user).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("{} WHERE id = ?1", USER_SELECT);
    let row = conn.query_row(&sql, [id], map_user).optional()?;
    Ok(row)
}

fn query_galaxy(conn: &Connection, galaxy_id: i64, viewer_id: i64) -> Result<Option<GalaxyRow>> {
    let sql = format!("{} WHERE g.id = ?2", GALAXY_SELECT);
    let row = conn.query_row(&sql, (viewer_id, galaxy_id), map_galaxy).optional()?;
    Ok(row)
}

fn query_galaxies(conn: &Connection, viewer_id: i64, filter: GalaxyFilter) -> Result<Vec<GalaxyRow>> {
    let member_clause =
        "EXISTS (SELECT 1 FROM galaxy_members m WHERE m.galaxy_id = g.id AND m.user_id = ?1)";
    let sql = match filter {
        GalaxyFilter::Joined => format!(
            "{} WHERE {} ORDER BY g.created_at DESC, g.id DESC",
            GALAXY_SELECT, member_clause
        ),
        GalaxyFilter::Public => format!(
            "{} WHERE g.is_public = 1 OR {} ORDER BY g.created_at DESC, g.id DESC",
            GALAXY_SELECT, member_clause
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([viewer_id], map_galaxy)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_is_member(conn: &Connection, galaxy_id: i64, user_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM galaxy_members WHERE galaxy_id = ?1 AND user_id = ?2",
            (galaxy_id, user_id),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn query_problem(conn: &Connection, problem_id: i64) -> Result<Option<ProblemRow>> {
    let sql = format!("{} WHERE p.id = ?1", PROBLEM_SELECT);
    let row = conn.query_row(&sql, [problem_id], map_problem).optional()?;
    Ok(row)
}

fn query_solution(conn: &Connection, solution_id: i64) -> Result<Option<SolutionRow>> {
    let sql = format!("{} WHERE s.id = ?1", SOLUTION_SELECT);
    let row = conn.query_row(&sql, [solution_id], map_solution).optional()?;
    Ok(row)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(db: &Database, name: &str) -> i64 {
        db.create_user(name, &format!("{}@x.com", name), "hash")
            .unwrap()
            .unwrap()
            .id
    }

    fn galaxy(db: &Database, owner: i64, is_public: bool) -> i64 {
        db.create_galaxy(&NewGalaxy {
            name: "Math Fun",
            description: Some("numbers"),
            category: "Math",
            is_public,
            password_hash: if is_public { None } else { Some("galaxy-hash") },
            owner_id: owner,
        })
        .unwrap()
        .id
    }

    fn rating_of(db: &Database, user_id: i64) -> i64 {
        db.get_user_by_id(user_id).unwrap().unwrap().rating
    }

    fn rating_rows(db: &Database, solution_id: i64) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM ratings WHERE solution_id = ?1",
                [solution_id],
                |r| r.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_email_or_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "alice");

        assert!(db.create_user("alice2", "alice@x.com", "h").unwrap().is_none());
        assert!(db.create_user("alice", "other@x.com", "h").unwrap().is_none());

        let fresh = db.create_user("bob", "bob@x.com", "h").unwrap().unwrap();
        assert_eq!(fresh.rating, 0);
    }

    #[test]
    fn galaxy_owner_is_first_member() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let g = galaxy(&db, alice, true);

        let row = db.get_galaxy(g, alice).unwrap().unwrap();
        assert!(row.is_member);
        assert_eq!(row.member_count, 1);
        assert_eq!(row.owner_username, "alice");
        assert!(db.is_member(g, alice).unwrap());
    }

    #[test]
    fn failed_owner_membership_leaves_no_galaxy() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");

        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER fail_membership BEFORE INSERT ON galaxy_members
                 BEGIN SELECT RAISE(ABORT, 'membership insert failed'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let res = db.create_galaxy(&NewGalaxy {
            name: "Math Fun",
            description: None,
            category: "Math",
            is_public: true,
            password_hash: None,
            owner_id: alice,
        });
        assert!(res.is_err());

        let galaxies: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM galaxies", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(galaxies, 0);
        assert!(db.list_galaxies(alice, GalaxyFilter::Joined).unwrap().is_empty());
    }

    #[test]
    fn add_member_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let g = galaxy(&db, alice, true);

        assert!(db.add_member(g, bob).unwrap());
        assert!(!db.add_member(g, bob).unwrap());

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM galaxy_members WHERE galaxy_id = ?1 AND user_id = ?2",
                    (g, bob),
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn galaxy_listing_respects_filter() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let public = galaxy(&db, alice, true);
        let private = galaxy(&db, alice, false);

        let browse: Vec<i64> = db
            .list_galaxies(bob, GalaxyFilter::Public)
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(browse, vec![public]);
        assert!(db.list_galaxies(bob, GalaxyFilter::Joined).unwrap().is_empty());

        db.add_member(private, bob).unwrap();
        let browse: Vec<i64> = db
            .list_galaxies(bob, GalaxyFilter::Public)
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(browse, vec![private, public]);

        let joined = db.list_galaxies(bob, GalaxyFilter::Joined).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].id, private);
        assert!(joined[0].is_member);
    }

    #[test]
    fn problems_are_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let g = galaxy(&db, alice, true);

        let first = db.create_problem(g, alice, "First problem", "d").unwrap();
        let second = db.create_problem(g, alice, "Second problem", "d").unwrap();
        assert_eq!(first.stars, 0);

        let ids: Vec<i64> = db.list_problems(g).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn solutions_order_by_stars_then_submission() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let g = galaxy(&db, alice, true);
        let p = db.create_problem(g, alice, "Ordering problem", "d").unwrap();

        let raters: Vec<i64> = (0..3).map(|i| user(&db, &format!("rater{}", i))).collect();
        for r in &raters {
            db.add_member(g, *r).unwrap();
        }

        // stars [3, 1, 3, 0] submitted in order t1 < t2 < t3 < t4
        let wanted = [3usize, 1, 3, 0];
        let mut ids = Vec::new();
        for (i, stars) in wanted.iter().enumerate() {
            let s = db.create_solution(p.id, alice, &format!("solution {}", i)).unwrap();
            for r in raters.iter().take(*stars) {
                assert!(matches!(db.rate_solution(s.id, *r).unwrap(), RateOutcome::Rated(_)));
            }
            ids.push(s.id);
        }

        let listed: Vec<(i64, i64)> = db
            .list_solutions(p.id)
            .unwrap()
            .iter()
            .map(|s| (s.id, s.stars))
            .collect();
        assert_eq!(
            listed,
            vec![(ids[0], 3), (ids[2], 3), (ids[1], 1), (ids[3], 0)]
        );
    }

    #[test]
    fn rating_updates_solution_and_author_together() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let g = galaxy(&db, alice, true);
        let p = db.create_problem(g, alice, "Rated problem", "d").unwrap();
        let s = db.create_solution(p.id, bob, "bob's answer").unwrap();

        let before = rating_of(&db, bob);
        let n = 4;
        for i in 0..n {
            let rater = user(&db, &format!("fan{}", i));
            match db.rate_solution(s.id, rater).unwrap() {
                RateOutcome::Rated(row) => {
                    assert_eq!(row.stars, i + 1);
                    assert_eq!(row.author_username, "bob");
                }
                _ => panic!("expected rating to succeed"),
            }
        }

        assert_eq!(db.get_solution(s.id).unwrap().unwrap().stars, n);
        assert_eq!(rating_of(&db, bob), before + n);
        assert_eq!(rating_rows(&db, s.id), n);
    }

    #[test]
    fn duplicate_rating_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let g = galaxy(&db, alice, true);
        let p = db.create_problem(g, alice, "Rated problem", "d").unwrap();
        let s = db.create_solution(p.id, bob, "bob's answer").unwrap();

        assert!(matches!(db.rate_solution(s.id, alice).unwrap(), RateOutcome::Rated(_)));
        assert!(matches!(db.rate_solution(s.id, alice).unwrap(), RateOutcome::AlreadyRated));

        assert_eq!(db.get_solution(s.id).unwrap().unwrap().stars, 1);
        assert_eq!(rating_of(&db, bob), 1);
        assert_eq!(rating_rows(&db, s.id), 1);
    }

    #[test]
    fn rating_missing_solution_reports_not_found() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        assert!(matches!(
            db.rate_solution(999, alice).unwrap(),
            RateOutcome::SolutionNotFound
        ));
    }

    #[test]
    fn failed_author_update_rolls_back_everything() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let g = galaxy(&db, alice, true);
        let p = db.create_problem(g, alice, "Rated problem", "d").unwrap();
        let s = db.create_solution(p.id, bob, "bob's answer").unwrap();

        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER fail_rating BEFORE UPDATE OF rating ON users
                 BEGIN SELECT RAISE(ABORT, 'rating update failed'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        assert!(db.rate_solution(s.id, alice).is_err());

        assert_eq!(db.get_solution(s.id).unwrap().unwrap().stars, 0);
        assert_eq!(rating_of(&db, bob), 0);
        assert_eq!(rating_rows(&db, s.id), 0);

        // The connection is still usable once the trigger is gone.
        db.with_conn(|conn| {
            conn.execute_batch("DROP TRIGGER fail_rating;")?;
            Ok(())
        })
        .unwrap();
        assert!(matches!(db.rate_solution(s.id, alice).unwrap(), RateOutcome::Rated(_)));
        assert_eq!(rating_of(&db, bob), 1);
    }

    #[test]
    fn leaderboard_sorts_by_rating_then_id() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let carol = user(&db, "carol");
        let g = galaxy(&db, alice, true);
        let p = db.create_problem(g, alice, "Board problem", "d").unwrap();
        let s_bob = db.create_solution(p.id, bob, "b").unwrap();
        let s_carol = db.create_solution(p.id, carol, "c").unwrap();

        db.rate_solution(s_bob.id, alice).unwrap();
        db.rate_solution(s_bob.id, carol).unwrap();
        db.rate_solution(s_carol.id, alice).unwrap();

        let board: Vec<(i64, i64)> = db
            .leaderboard(50)
            .unwrap()
            .iter()
            .map(|r| (r.id, r.rating))
            .collect();
        assert_eq!(board, vec![(bob, 2), (carol, 1), (alice, 0)]);

        assert_eq!(db.leaderboard(1).unwrap().len(), 1);
    }
}
