//! Insert statements that populate the fact and dimension tables from
//! staging.

use crate::pipeline::Step;
use crate::schema::catalog::{ARTISTS_DIM, SONGPLAYS_FACT, SONGS_DIM, TIMESTAMPS_DIM, USERS_DIM};
use crate::warehouse::Dialect;

/// Every event that matches a song by artist name OR by title becomes a
/// songplay. An event matching several songs yields several rows.
pub const SONGPLAYS_INSERT: &str = "
INSERT INTO songplays_fact (ts, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT logs.ts, logs.userId, logs.level, songs.song_id, songs.artist_id, logs.sessionId, logs.location, logs.userAgent
FROM staging_events AS logs
JOIN staging_songs AS songs ON logs.artist = songs.artist_name OR logs.song = songs.title
";

/// Users seen on 'NextSong' events; the latest event per user decides name
/// and level.
pub const USERS_INSERT: &str = "
INSERT INTO users_dim (user_id, first_name, last_name, gender, level)
SELECT userId, firstName, lastName, gender, level
FROM (
    SELECT userId, firstName, lastName, gender, level,
           ROW_NUMBER() OVER (PARTITION BY userId ORDER BY ts DESC, level, firstName, lastName) AS seen_rank
    FROM staging_events
    WHERE page = 'NextSong' AND userId IS NOT NULL
) AS latest
WHERE seen_rank = 1
";

pub const SONGS_INSERT: &str = "
INSERT INTO songs_dim (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM (
    SELECT song_id, title, artist_id, year, duration,
           ROW_NUMBER() OVER (PARTITION BY song_id ORDER BY title, artist_id, year, duration) AS song_rank
    FROM staging_songs
) AS distinct_songs
WHERE song_rank = 1
";

pub const ARTISTS_INSERT: &str = "
INSERT INTO artists_dim (artist_id, name, location, latitude, longitude)
SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM (
    SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude,
           ROW_NUMBER() OVER (
               PARTITION BY artist_id
               ORDER BY artist_name, artist_location, artist_latitude, artist_longitude
           ) AS artist_rank
    FROM staging_songs
) AS distinct_artists
WHERE artist_rank = 1
";

const TIMESTAMPS_INSERT_REDSHIFT: &str = "
INSERT INTO timestamps_dim (ts, start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT ts, start_time,
       EXTRACT(HOUR FROM start_time), EXTRACT(DAY FROM start_time), EXTRACT(WEEK FROM start_time),
       EXTRACT(MONTH FROM start_time), EXTRACT(YEAR FROM start_time), EXTRACT(DOW FROM start_time)
FROM (
    SELECT ts, TIMESTAMP 'epoch' + ts/1000 * INTERVAL '1 second' AS start_time
    FROM staging_events
) AS event_times
";

// ISO week: day-of-year of the Thursday in the same Monday-based week
const TIMESTAMPS_INSERT_SQLITE: &str = "
INSERT INTO timestamps_dim (ts, start_time, hour, day, week, month, year, weekday)
SELECT ts, start_time,
       CAST(strftime('%H', start_time) AS INTEGER),
       CAST(strftime('%d', start_time) AS INTEGER),
       (CAST(strftime('%j', date(start_time, '-3 days', 'weekday 4')) AS INTEGER) - 1) / 7 + 1,
       CAST(strftime('%m', start_time) AS INTEGER),
       CAST(strftime('%Y', start_time) AS INTEGER),
       CAST(strftime('%w', start_time) AS INTEGER)
FROM (
    SELECT DISTINCT ts, datetime(ts / 1000, 'unixepoch') AS start_time
    FROM staging_events
) AS event_times
";

pub fn timestamps_insert(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Redshift => TIMESTAMPS_INSERT_REDSHIFT,
        Dialect::Sqlite => TIMESTAMPS_INSERT_SQLITE,
    }
}

/// The five transform statements in execution order. The fact table goes
/// first; it reads only staging, so it does not wait on the dimensions.
pub fn transform_steps(dialect: Dialect) -> Vec<Step> {
    vec![
        Step::sql(format!("insert {}", SONGPLAYS_FACT.name), SONGPLAYS_INSERT),
        Step::sql(format!("insert {}", USERS_DIM.name), USERS_INSERT),
        Step::sql(format!("insert {}", SONGS_DIM.name), SONGS_INSERT),
        Step::sql(format!("insert {}", ARTISTS_DIM.name), ARTISTS_INSERT),
        Step::sql(format!("insert {}", TIMESTAMPS_DIM.name), timestamps_insert(dialect)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_order() {
        let names: Vec<_> = transform_steps(Dialect::Sqlite)
            .iter()
            .map(Step::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "insert songplays_fact",
                "insert users_dim",
                "insert songs_dim",
                "insert artists_dim",
                "insert timestamps_dim",
            ]
        );
    }

    #[test]
    fn test_songplay_join_stays_loose() {
        assert!(SONGPLAYS_INSERT
            .contains("ON logs.artist = songs.artist_name OR logs.song = songs.title"));
    }

    #[test]
    fn test_timestamp_conversion_per_dialect() {
        assert!(timestamps_insert(Dialect::Redshift)
            .contains("TIMESTAMP 'epoch' + ts/1000 * INTERVAL '1 second'"));
        assert!(timestamps_insert(Dialect::Sqlite).contains("datetime(ts / 1000, 'unixepoch')"));
    }
}
