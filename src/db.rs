// 🗄️ SQLite Gateway - players, lookups, memberships and the audit trail
//
// Every batch runs in one transaction: it commits whole or not at all.
// Each created or updated record also gets an event row (who, when, what).

use crate::entities::{
    Division, League, LookupTables, MtsaMembership, NewMtsaMembership, NewPlayer,
    NewTnMembership, Player, PlayerUpdate, Season, Team, TnMembership,
};
use crate::export::MissingPlayer;
use crate::gateway::{Gateway, GatewayResult};
use crate::import::ImportReport;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event for audit trail (Rich Hickey: "Every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> GatewayResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Players (canonical registrants)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            dob REAL,
            gender TEXT,
            address TEXT,
            city TEXT,
            state TEXT,
            zip TEXT,
            phone TEXT,
            email TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME
        )",
        [],
    )?;

    // ==========================================================================
    // Lookups (maintained by the association, read-only to imports)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            sid_code TEXT,
            current_season_id INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS seasons (
            id INTEGER PRIMARY KEY,
            league_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            tnsoccer_season_id TEXT,
            tnsoccer_season_name TEXT,
            tnsoccer_year INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS divisions (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            mtsa_name TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Season memberships (create-only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tnsoccer_player_seasons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL REFERENCES players(id),
            season_id INTEGER NOT NULL,
            play_type TEXT,
            tn_team_id TEXT,
            age TEXT,
            play_level TEXT,
            team_name TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (player_id, season_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS mtsa_players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL REFERENCES players(id),
            season_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            division_id INTEGER NOT NULL,
            other_phone TEXT,
            order_date TEXT,
            order_no TEXT,
            order_detail_description TEXT,
            order_item_amount REAL,
            order_item_amount_paid REAL,
            order_item_balance REAL,
            order_payment_status TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (player_id, season_id, team_id, division_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_players_name ON players(last_name, first_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_mtsa_season_team ON mtsa_players(season_id, team_id, division_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> GatewayResult<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> GatewayResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let rows = stmt
        .query_map(params![entity_type, entity_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut events = Vec::with_capacity(rows.len());
    for (event_id, timestamp, event_type, entity_type, entity_id, data, actor) in rows {
        let timestamp = match DateTime::parse_from_rfc3339(&timestamp) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!("Event {} has unreadable timestamp '{}': {}", event_id, timestamp, e);
                continue;
            }
        };
        events.push(Event {
            event_id,
            timestamp,
            event_type,
            entity_type,
            entity_id,
            data: serde_json::from_str(&data)?,
            actor,
        });
    }

    Ok(events)
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const PLAYER_COLUMNS: &str =
    "id, player_id, last_name, first_name, dob, gender, address, city, state, zip, phone, email";

fn player_from_row(row: &Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        player_id: row.get(1)?,
        last_name: row.get(2)?,
        first_name: row.get(3)?,
        dob: row.get(4)?,
        gender: row.get(5)?,
        address: row.get(6)?,
        city: row.get(7)?,
        state: row.get(8)?,
        zip: row.get(9)?,
        phone: row.get(10)?,
        email: row.get(11)?,
    })
}

/// UNIQUE violations only; a foreign key failure is a real error.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ============================================================================
// ROSTER QUERY TYPES
// ============================================================================

/// A team/division pair with MTSA registrations in a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDivision {
    pub team_id: i64,
    pub team_name: String,
    pub division_id: i64,
    pub division_name: String,
    pub players: i64,
}

/// One line of a team roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: i64,
    pub full_name: String,

    /// Age as reported by TN Soccer for the same season
    pub age: Option<String>,

    /// TN Soccer's player number
    pub player_id: Option<String>,
}

// ============================================================================
// SQLITE GATEWAY
// ============================================================================

pub struct SqliteGateway {
    conn: Connection,
    actor: String,
}

impl SqliteGateway {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path, actor: &str) -> GatewayResult<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        info!("Opened players database {}", path.display());
        Ok(SqliteGateway {
            conn,
            actor: actor.to_string(),
        })
    }

    pub fn open_in_memory(actor: &str) -> GatewayResult<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteGateway {
            conn,
            actor: actor.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace the four lookup tables' rows with the given ones (by id).
    pub fn load_lookups(&mut self, lookups: &LookupTables) -> GatewayResult<usize> {
        let tx = self.conn.transaction()?;
        let mut loaded = 0;

        for league in &lookups.leagues {
            loaded += tx.execute(
                "INSERT OR REPLACE INTO leagues (id, name, sid_code, current_season_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![league.id, league.name, league.sid_code, league.current_season_id],
            )?;
        }
        for season in &lookups.seasons {
            loaded += tx.execute(
                "INSERT OR REPLACE INTO seasons
                    (id, league_id, name, tnsoccer_season_id, tnsoccer_season_name, tnsoccer_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    season.id,
                    season.league_id,
                    season.name,
                    season.tnsoccer_season_id,
                    season.tnsoccer_season_name,
                    season.tnsoccer_year,
                ],
            )?;
        }
        for division in &lookups.divisions {
            loaded += tx.execute(
                "INSERT OR REPLACE INTO divisions (id, name, mtsa_name) VALUES (?1, ?2, ?3)",
                params![division.id, division.name, division.mtsa_name],
            )?;
        }
        for team in &lookups.teams {
            loaded += tx.execute(
                "INSERT OR REPLACE INTO teams (id, name) VALUES (?1, ?2)",
                params![team.id, team.name],
            )?;
        }

        insert_event(
            &tx,
            &Event::new(
                "lookups_loaded",
                "lookups",
                "all",
                serde_json::json!({
                    "leagues": lookups.leagues.len(),
                    "seasons": lookups.seasons.len(),
                    "divisions": lookups.divisions.len(),
                    "teams": lookups.teams.len(),
                }),
                &self.actor,
            ),
        )?;

        tx.commit()?;
        info!("Loaded {} lookup rows", loaded);
        Ok(loaded)
    }

    pub fn get_players(&self) -> GatewayResult<Vec<Player>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM players ORDER BY id", PLAYER_COLUMNS))?;
        let players = stmt
            .query_map([], player_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(players)
    }

    pub fn get_lookups(&self) -> GatewayResult<LookupTables> {
        let leagues = self
            .conn
            .prepare("SELECT id, name, sid_code, current_season_id FROM leagues ORDER BY id")?
            .query_map([], |row| {
                Ok(League {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    sid_code: row.get(2)?,
                    current_season_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let seasons = self
            .conn
            .prepare(
                "SELECT id, league_id, name, tnsoccer_season_id, tnsoccer_season_name, tnsoccer_year
                 FROM seasons ORDER BY id",
            )?
            .query_map([], |row| {
                Ok(Season {
                    id: row.get(0)?,
                    league_id: row.get(1)?,
                    name: row.get(2)?,
                    tnsoccer_season_id: row.get(3)?,
                    tnsoccer_season_name: row.get(4)?,
                    tnsoccer_year: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let divisions = self
            .conn
            .prepare("SELECT id, name, mtsa_name FROM divisions ORDER BY id")?
            .query_map([], |row| {
                Ok(Division {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    mtsa_name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let teams = self
            .conn
            .prepare("SELECT id, name FROM teams ORDER BY id")?
            .query_map([], |row| {
                Ok(Team {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LookupTables {
            leagues,
            seasons,
            divisions,
            teams,
        })
    }

    pub fn get_tn_memberships(&self) -> GatewayResult<Vec<TnMembership>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, season_id, play_type, tn_team_id, age, play_level, team_name
             FROM tnsoccer_player_seasons ORDER BY id",
        )?;
        let memberships = stmt
            .query_map([], |row| {
                Ok(TnMembership {
                    id: row.get(0)?,
                    record: NewTnMembership {
                        player_id: row.get(1)?,
                        season_id: row.get(2)?,
                        play_type: row.get(3)?,
                        tn_team_id: row.get(4)?,
                        age: row.get(5)?,
                        play_level: row.get(6)?,
                        team_name: row.get(7)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(memberships)
    }

    pub fn get_mtsa_memberships(&self) -> GatewayResult<Vec<MtsaMembership>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, season_id, team_id, division_id, other_phone, order_date,
                    order_no, order_detail_description, order_item_amount,
                    order_item_amount_paid, order_item_balance, order_payment_status
             FROM mtsa_players ORDER BY id",
        )?;
        let memberships = stmt
            .query_map([], |row| {
                Ok(MtsaMembership {
                    id: row.get(0)?,
                    record: NewMtsaMembership {
                        player_id: row.get(1)?,
                        season_id: row.get(2)?,
                        team_id: row.get(3)?,
                        division_id: row.get(4)?,
                        other_phone: row.get(5)?,
                        order_date: row.get(6)?,
                        order_no: row.get(7)?,
                        order_detail_description: row.get(8)?,
                        order_item_amount: row.get(9)?,
                        order_item_amount_paid: row.get(10)?,
                        order_item_balance: row.get(11)?,
                        order_payment_status: row.get(12)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(memberships)
    }

    // ------------------------------------------------------------------------
    // Roster queries
    // ------------------------------------------------------------------------

    /// Team/division pairs with MTSA registrations in the season.
    pub fn get_team_divisions(&self, season_id: i64) -> GatewayResult<Vec<TeamDivision>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, d.id, d.name, COUNT(DISTINCT m.player_id)
             FROM mtsa_players m
             JOIN teams t ON t.id = m.team_id
             JOIN divisions d ON d.id = m.division_id
             WHERE m.season_id = ?1
             GROUP BY t.id, t.name, d.id, d.name
             ORDER BY d.name, t.name",
        )?;
        let rows = stmt
            .query_map(params![season_id], |row| {
                Ok(TeamDivision {
                    team_id: row.get(0)?,
                    team_name: row.get(1)?,
                    division_id: row.get(2)?,
                    division_name: row.get(3)?,
                    players: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Players registered with MTSA on one team/division for the season.
    pub fn get_roster(
        &self,
        season_id: i64,
        team_id: i64,
        division_id: i64,
    ) -> GatewayResult<Vec<RosterEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT p.id, p.first_name, p.last_name, tn.age, p.player_id
             FROM mtsa_players m
             JOIN players p ON p.id = m.player_id
             LEFT JOIN tnsoccer_player_seasons tn
                ON tn.player_id = p.id AND tn.season_id = m.season_id
             WHERE m.season_id = ?1 AND m.team_id = ?2 AND m.division_id = ?3
             ORDER BY p.last_name, p.first_name",
        )?;
        let roster = stmt
            .query_map(params![season_id, team_id, division_id], |row| {
                let first: String = row.get(1)?;
                let last: String = row.get(2)?;
                Ok(RosterEntry {
                    id: row.get(0)?,
                    full_name: format!("{} {}", first.trim(), last.trim()),
                    age: row.get(3)?,
                    player_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roster)
    }

    /// Players registered with MTSA for the season but missing from TN Soccer.
    ///
    /// Play type comes from the player's most recent earlier TN membership.
    pub fn get_missing_players(&self, season_id: i64) -> GatewayResult<Vec<MissingPlayer>> {
        let sql = format!(
            "SELECT {}, (
                SELECT tn.play_type FROM tnsoccer_player_seasons tn
                WHERE tn.player_id = players.id AND tn.season_id < ?1
                ORDER BY tn.season_id DESC
                LIMIT 1
             )
             FROM players
             WHERE EXISTS (
                SELECT 1 FROM mtsa_players m
                WHERE m.player_id = players.id AND m.season_id = ?1
             )
             AND NOT EXISTS (
                SELECT 1 FROM tnsoccer_player_seasons tn
                WHERE tn.player_id = players.id AND tn.season_id = ?1
             )
             ORDER BY last_name, first_name",
            PLAYER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let missing = stmt
            .query_map(params![season_id], |row| {
                Ok(MissingPlayer {
                    player: player_from_row(row)?,
                    play_type: row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(missing)
    }

    fn get_player(conn: &Connection, id: i64) -> GatewayResult<Option<Player>> {
        let player = conn
            .query_row(
                &format!("SELECT {} FROM players WHERE id = ?1", PLAYER_COLUMNS),
                params![id],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }
}

impl Gateway for SqliteGateway {
    fn read_snapshot(&self) -> GatewayResult<Snapshot> {
        let snapshot = Snapshot::new()
            .with_players(self.get_players()?)
            .with_lookups(self.get_lookups()?)
            .with_tn_memberships(self.get_tn_memberships()?)
            .with_mtsa_memberships(self.get_mtsa_memberships()?);

        debug!(
            "Snapshot: {} players, {} seasons, {} TN + {} MTSA memberships",
            snapshot.players().len(),
            snapshot.seasons.len(),
            snapshot.tn_memberships().len(),
            snapshot.mtsa_memberships().len()
        );
        Ok(snapshot)
    }

    fn create_players(&mut self, players: &[NewPlayer]) -> GatewayResult<Vec<Player>> {
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(players.len());

        for player in players {
            tx.execute(
                "INSERT INTO players (
                    player_id, last_name, first_name, dob, gender, address,
                    city, state, zip, phone, email
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    player.player_id,
                    player.last_name,
                    player.first_name,
                    player.dob,
                    player.gender,
                    player.address,
                    player.city,
                    player.state,
                    player.zip,
                    player.phone,
                    player.email,
                ],
            )?;
            let id = tx.last_insert_rowid();

            insert_event(
                &tx,
                &Event::new(
                    "player_created",
                    "player",
                    &id.to_string(),
                    serde_json::to_value(player)?,
                    &self.actor,
                ),
            )?;
            created.push(Player::from_new(id, player.clone()));
        }

        tx.commit()?;
        Ok(created)
    }

    fn update_players(&mut self, updates: &[PlayerUpdate]) -> GatewayResult<Vec<Player>> {
        let tx = self.conn.transaction()?;
        let mut updated = Vec::with_capacity(updates.len());

        for update in updates {
            let c = &update.changes;
            let changed = tx.execute(
                "UPDATE players SET
                    player_id = COALESCE(?2, player_id),
                    last_name = COALESCE(?3, last_name),
                    first_name = COALESCE(?4, first_name),
                    dob = COALESCE(?5, dob),
                    gender = COALESCE(?6, gender),
                    address = COALESCE(?7, address),
                    city = COALESCE(?8, city),
                    state = COALESCE(?9, state),
                    zip = COALESCE(?10, zip),
                    phone = COALESCE(?11, phone),
                    email = COALESCE(?12, email),
                    updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1",
                params![
                    update.id,
                    c.player_id,
                    c.last_name,
                    c.first_name,
                    c.dob,
                    c.gender,
                    c.address,
                    c.city,
                    c.state,
                    c.zip,
                    c.phone,
                    c.email,
                ],
            )?;
            if changed == 0 {
                warn!("Player {} not found; update skipped", update.id);
                continue;
            }

            insert_event(
                &tx,
                &Event::new(
                    "player_updated",
                    "player",
                    &update.id.to_string(),
                    serde_json::to_value(c)?,
                    &self.actor,
                ),
            )?;

            if let Some(player) = Self::get_player(&tx, update.id)? {
                updated.push(player);
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    fn create_tn_memberships(
        &mut self,
        memberships: &[NewTnMembership],
    ) -> GatewayResult<Vec<TnMembership>> {
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(memberships.len());

        for m in memberships {
            let result = tx.execute(
                "INSERT INTO tnsoccer_player_seasons (
                    player_id, season_id, play_type, tn_team_id, age, play_level, team_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    m.player_id,
                    m.season_id,
                    m.play_type,
                    m.tn_team_id,
                    m.age,
                    m.play_level,
                    m.team_name,
                ],
            );

            match result {
                Ok(_) => {
                    let id = tx.last_insert_rowid();
                    insert_event(
                        &tx,
                        &Event::new(
                            "membership_created",
                            "tnsoccer_player_season",
                            &id.to_string(),
                            serde_json::to_value(m)?,
                            &self.actor,
                        ),
                    )?;
                    created.push(TnMembership {
                        id,
                        record: m.clone(),
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!("TN membership ({}, {}) already stored", m.player_id, m.season_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit()?;
        Ok(created)
    }

    fn create_mtsa_memberships(
        &mut self,
        memberships: &[NewMtsaMembership],
    ) -> GatewayResult<Vec<MtsaMembership>> {
        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(memberships.len());

        for m in memberships {
            let result = tx.execute(
                "INSERT INTO mtsa_players (
                    player_id, season_id, team_id, division_id, other_phone, order_date,
                    order_no, order_detail_description, order_item_amount,
                    order_item_amount_paid, order_item_balance, order_payment_status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    m.player_id,
                    m.season_id,
                    m.team_id,
                    m.division_id,
                    m.other_phone,
                    m.order_date,
                    m.order_no,
                    m.order_detail_description,
                    m.order_item_amount,
                    m.order_item_amount_paid,
                    m.order_item_balance,
                    m.order_payment_status,
                ],
            );

            match result {
                Ok(_) => {
                    let id = tx.last_insert_rowid();
                    insert_event(
                        &tx,
                        &Event::new(
                            "membership_created",
                            "mtsa_player",
                            &id.to_string(),
                            serde_json::to_value(m)?,
                            &self.actor,
                        ),
                    )?;
                    created.push(MtsaMembership {
                        id,
                        record: m.clone(),
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!(
                        "MTSA membership ({}, {}, {}, {}) already stored",
                        m.player_id, m.season_id, m.team_id, m.division_id
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit()?;
        Ok(created)
    }

    fn record_upload(&mut self, report: &ImportReport) -> GatewayResult<()> {
        insert_event(
            &self.conn,
            &Event::new(
                "upload_imported",
                "upload",
                &report.digest,
                serde_json::to_value(report)?,
                &self.actor,
            ),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
