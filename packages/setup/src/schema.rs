//! SQL printed for manual execution in the hosted database console.

/// The server's migration, kept in one place
pub const SCHEMA_SQL: &str =
    include_str!("../../../apps/server/migrations/0001_fellowship_schema.sql");

/// Test records for a fresh database: one group, a prayer request and an event
pub const SAMPLE_DATA_SQL: &str = r#"-- Sample data for testing

WITH new_group AS (
    INSERT INTO fellowship_groups (name, description, category, location_type, meeting_schedule)
    VALUES ('Young Adults Bible Study', 'Weekly study through the Gospel of John',
            'bible_study', 'in_person', 'Thursdays 7pm')
    RETURNING id
)
INSERT INTO events (group_id, title, description, event_date, location)
SELECT id, 'Community Worship Night', 'An evening of worship and fellowship',
       NOW() + INTERVAL '7 days', 'Main Hall'
FROM new_group;

INSERT INTO prayer_requests (title, description, category)
VALUES ('Healing for a friend', 'Please pray for a quick recovery after surgery', 'healing');
"#;

/// The script to print, with the sample records appended when asked
pub fn script(with_sample_data: bool) -> String {
    let mut sql = SCHEMA_SQL.trim_end().to_string();
    sql.push('\n');
    if with_sample_data {
        sql.push('\n');
        sql.push_str(SAMPLE_DATA_SQL);
    }
    sql
}
