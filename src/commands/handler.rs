//! Command Handler Module
//!
//! This module implements the ttlkv shell commands. It receives tokenized
//! arguments, dispatches them against the [`Store`], and returns a [`Reply`].
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET key value [ttl]` - Set a key (ttl in seconds, 0 = never expires)
//! - `GET key` - Get a key's value
//! - `DEL key [key ...]` - Delete keys, expired or not
//! - `EXISTS key [key ...]` - Count live keys
//! - `TTL key` - Remaining TTL (-1 never expires, -2 missing)
//! - `RANGE start count` - Up to `count` live pairs with keys >= `start`
//!
//! ### Eviction Commands
//! - `EVICT [count]` - Evict the entry that expired first, or up to `count`
//! - `NEXTEXPIRY` - Earliest pending expiry time
//!
//! ### Clock Commands
//! - `TIME` - Current clock reading
//! - `ADVANCE seconds` - Move a manual clock forward
//! - `SETTIME time` - Set a manual clock
//!
//! ### Server Commands
//! - `PING [message]`, `ECHO message`, `INFO`, `DBSIZE`, `FLUSHDB`, `QUIT`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CommandHandler<C>                         │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ parse_line()│───>│  dispatch() │───>│   cmd_*()   │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                           Store<C>          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::clock::{Clock, ManualClock};
use crate::commands::Reply;
use crate::storage::Store;
use bytes::Bytes;
use tracing::debug;

/// Executes shell commands against a store it owns.
pub struct CommandHandler<C> {
    /// The store
    store: Store<C>,
    /// Handle used by ADVANCE/SETTIME; `None` when running on a real clock
    time_control: Option<ManualClock>,
}

impl<C: Clock> CommandHandler<C> {
    /// Creates a command handler over the given store.
    ///
    /// Clock commands that change time are rejected.
    pub fn new(store: Store<C>) -> Self {
        Self {
            store,
            time_control: None,
        }
    }

    /// Creates a command handler whose ADVANCE/SETTIME commands drive `clock`.
    ///
    /// `clock` should be a handle to the same [`ManualClock`] the store reads.
    pub fn with_time_control(store: Store<C>, clock: ManualClock) -> Self {
        Self {
            store,
            time_control: Some(clock),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Store<C> {
        &self.store
    }

    /// Executes a command and returns the reply.
    ///
    /// # Arguments
    ///
    /// * `args` - The command name followed by its arguments
    pub fn execute(&mut self, args: &[Bytes]) -> Reply {
        let Some((name, rest)) = args.split_first() else {
            return Reply::error("ERR empty command");
        };

        let cmd_name = match std::str::from_utf8(name) {
            Ok(s) => s.to_uppercase(),
            Err(_) => return Reply::error("ERR invalid command name"),
        };

        debug!(command = %cmd_name, args = rest.len(), "Executing command");
        self.dispatch(&cmd_name, rest)
    }

    /// Dispatches a command to its handler.
    fn dispatch(&mut self, cmd: &str, args: &[Bytes]) -> Reply {
        match cmd {
            // Key commands
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "TTL" => self.cmd_ttl(args),
            "RANGE" => self.cmd_range(args),

            // Eviction commands
            "EVICT" => self.cmd_evict(args),
            "NEXTEXPIRY" => self.cmd_nextexpiry(args),

            // Clock commands
            "TIME" => self.cmd_time(args),
            "ADVANCE" => self.cmd_advance(args),
            "SETTIME" => self.cmd_settime(args),

            // Server commands
            "PING" => self.cmd_ping(args),
            "ECHO" => self.cmd_echo(args),
            "INFO" => self.cmd_info(args),
            "DBSIZE" => self.cmd_dbsize(args),
            "FLUSHDB" => self.cmd_flushdb(args),
            "QUIT" => self.cmd_quit(args),

            // Unknown command
            _ => Reply::error(format!("ERR unknown command '{}'", cmd)),
        }
    }

    // ========================================================================
    // Helper functions
    // ========================================================================

    fn wrong_arity(cmd: &str) -> Reply {
        Reply::error(format!(
            "ERR wrong number of arguments for '{}' command",
            cmd
        ))
    }

    /// Parses a numeric argument.
    fn get_integer<T: std::str::FromStr>(value: &Bytes) -> Option<T> {
        std::str::from_utf8(value).ok().and_then(|s| s.parse().ok())
    }

    // ========================================================================
    // Key Commands
    // ========================================================================

    /// SET key value [ttl]
    fn cmd_set(&mut self, args: &[Bytes]) -> Reply {
        if args.len() != 2 && args.len() != 3 {
            return Self::wrong_arity("SET");
        }

        let ttl = match args.get(2) {
            Some(raw) => match Self::get_integer::<u32>(raw) {
                Some(ttl) => ttl,
                None => return Reply::error("ERR ttl is not an integer or out of range"),
            },
            None => 0,
        };

        self.store.set(args[0].clone(), args[1].clone(), ttl);
        Reply::ok()
    }

    /// GET key
    fn cmd_get(&mut self, args: &[Bytes]) -> Reply {
        if args.len() != 1 {
            return Self::wrong_arity("GET");
        }

        match self.store.get(&args[0]) {
            Some(value) => Reply::Bulk(value),
            None => Reply::nil(),
        }
    }

    /// DEL key [key ...]
    fn cmd_del(&mut self, args: &[Bytes]) -> Reply {
        if args.is_empty() {
            return Self::wrong_arity("DEL");
        }

        let deleted = args.iter().filter(|key| self.store.remove(key)).count();
        Reply::integer(deleted as i64)
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&mut self, args: &[Bytes]) -> Reply {
        if args.is_empty() {
            return Self::wrong_arity("EXISTS");
        }

        let count = args
            .iter()
            .filter(|key| self.store.contains_key(key))
            .count();
        Reply::integer(count as i64)
    }

    /// TTL key
    fn cmd_ttl(&mut self, args: &[Bytes]) -> Reply {
        if args.len() != 1 {
            return Self::wrong_arity("TTL");
        }

        match self.store.ttl(&args[0]) {
            Some(ttl) => Reply::integer(ttl),
            None => Reply::integer(-2), // Key doesn't exist
        }
    }

    /// RANGE start count
    fn cmd_range(&mut self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_arity("RANGE");
        }

        let count = match Self::get_integer::<u32>(&args[1]) {
            Some(n) => n,
            None => return Reply::error("ERR count is not an integer or out of range"),
        };

        Reply::pairs(self.store.get_many_sorted(&args[0], count))
    }

    // ========================================================================
    // Eviction Commands
    // ========================================================================

    /// EVICT [count]
    fn cmd_evict(&mut self, args: &[Bytes]) -> Reply {
        match args {
            [] => match self.store.remove_one_expired_entry() {
                Some((key, value)) => Reply::array(vec![Reply::Bulk(key), Reply::Bulk(value)]),
                None => Reply::nil(),
            },
            [count] => match Self::get_integer::<usize>(count) {
                Some(limit) => Reply::pairs(self.store.evict_expired(limit)),
                None => Reply::error("ERR count is not an integer or out of range"),
            },
            _ => Self::wrong_arity("EVICT"),
        }
    }

    /// NEXTEXPIRY
    fn cmd_nextexpiry(&mut self, args: &[Bytes]) -> Reply {
        if !args.is_empty() {
            return Self::wrong_arity("NEXTEXPIRY");
        }

        match self.store.next_expiry() {
            Some(at) => Reply::integer(clamp_i64(at)),
            None => Reply::nil(),
        }
    }

    // ========================================================================
    // Clock Commands
    // ========================================================================

    /// TIME
    fn cmd_time(&mut self, args: &[Bytes]) -> Reply {
        if !args.is_empty() {
            return Self::wrong_arity("TIME");
        }

        Reply::integer(clamp_i64(self.store.clock().now()))
    }

    /// ADVANCE seconds
    fn cmd_advance(&mut self, args: &[Bytes]) -> Reply {
        if args.len() != 1 {
            return Self::wrong_arity("ADVANCE");
        }

        let Some(clock) = &self.time_control else {
            return Reply::error("ERR clock is not manual");
        };

        match Self::get_integer::<u64>(&args[0]) {
            Some(seconds) => Reply::integer(clamp_i64(clock.advance(seconds))),
            None => Reply::error("ERR seconds is not an integer or out of range"),
        }
    }

    /// SETTIME time
    fn cmd_settime(&mut self, args: &[Bytes]) -> Reply {
        if args.len() != 1 {
            return Self::wrong_arity("SETTIME");
        }

        let Some(clock) = &self.time_control else {
            return Reply::error("ERR clock is not manual");
        };

        match Self::get_integer::<u64>(&args[0]) {
            Some(time) => {
                clock.set(time);
                Reply::integer(clamp_i64(time))
            }
            None => Reply::error("ERR time is not an integer or out of range"),
        }
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&mut self, args: &[Bytes]) -> Reply {
        match args {
            [] => Reply::pong(),
            [message] => Reply::Bulk(message.clone()),
            _ => Self::wrong_arity("PING"),
        }
    }

    /// ECHO message
    fn cmd_echo(&mut self, args: &[Bytes]) -> Reply {
        match args {
            [message] => Reply::Bulk(message.clone()),
            _ => Self::wrong_arity("ECHO"),
        }
    }

    /// INFO
    fn cmd_info(&mut self, args: &[Bytes]) -> Reply {
        if !args.is_empty() {
            return Self::wrong_arity("INFO");
        }

        let stats = self.store.stats();
        let mem = self.store.memory_info();
        let next_expiry = match self.store.next_expiry() {
            Some(at) => at.to_string(),
            None => "none".to_string(),
        };

        let info = format!(
            "# Server\n\
             ttlkv_version:{}\n\
             clock:{}\n\
             now:{}\n\
             \n\
             # Keyspace\n\
             keys:{}\n\
             live_keys:{}\n\
             expiring_keys:{}\n\
             next_expiry:{}\n\
             \n\
             # Memory\n\
             used_memory:{}\n\
             used_memory_human:{}KB\n\
             \n\
             # Operations\n\
             set_ops:{}\n\
             del_ops:{}\n\
             evicted_keys:{}",
            crate::VERSION,
            if self.time_control.is_some() { "manual" } else { "system" },
            self.store.clock().now(),
            stats.keys,
            mem.keys,
            stats.expiring,
            next_expiry,
            mem.used_memory,
            mem.used_memory / 1024,
            stats.set_ops,
            stats.del_ops,
            stats.evicted,
        );

        Reply::status(info)
    }

    /// DBSIZE
    fn cmd_dbsize(&mut self, args: &[Bytes]) -> Reply {
        if !args.is_empty() {
            return Self::wrong_arity("DBSIZE");
        }

        Reply::integer(self.store.len() as i64)
    }

    /// FLUSHDB
    fn cmd_flushdb(&mut self, args: &[Bytes]) -> Reply {
        if !args.is_empty() {
            return Self::wrong_arity("FLUSHDB");
        }

        self.store.clear();
        Reply::ok()
    }

    /// QUIT
    fn cmd_quit(&mut self, args: &[Bytes]) -> Reply {
        if !args.is_empty() {
            return Self::wrong_arity("QUIT");
        }

        Reply::ok()
    }
}

/// Clamps a clock reading into the integer reply range.
fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_handler() -> (CommandHandler<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let store = Store::new(clock.clone());
        (
            CommandHandler::with_time_control(store, clock.clone()),
            clock,
        )
    }

    fn make_command(args: &[&str]) -> Vec<Bytes> {
        args.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    fn run(handler: &mut CommandHandler<ManualClock>, args: &[&str]) -> Reply {
        handler.execute(&make_command(args))
    }

    fn bulks(values: &[&str]) -> Reply {
        Reply::array(
            values
                .iter()
                .map(|s| Reply::bulk(Bytes::from(s.to_string())))
                .collect(),
        )
    }

    #[test]
    fn test_ping() {
        let (mut handler, _) = create_handler();

        assert_eq!(run(&mut handler, &["PING"]), Reply::pong());
        assert_eq!(run(&mut handler, &["ping", "hello"]), Reply::bulk("hello"));
        assert_eq!(run(&mut handler, &["ECHO", "hi"]), Reply::bulk("hi"));
    }

    #[test]
    fn test_set_get() {
        let (mut handler, _) = create_handler();

        assert_eq!(run(&mut handler, &["SET", "key", "value"]), Reply::ok());
        assert_eq!(run(&mut handler, &["GET", "key"]), Reply::bulk("value"));
        assert_eq!(run(&mut handler, &["GET", "missing"]), Reply::nil());
    }

    #[test]
    fn test_set_with_ttl_and_advance() {
        let (mut handler, clock) = create_handler();

        run(&mut handler, &["SET", "session", "abc", "10"]);
        assert_eq!(run(&mut handler, &["TTL", "session"]), Reply::integer(10));

        assert_eq!(run(&mut handler, &["ADVANCE", "4"]), Reply::integer(4));
        assert_eq!(clock.now(), 4);
        assert_eq!(run(&mut handler, &["TTL", "session"]), Reply::integer(6));

        assert_eq!(run(&mut handler, &["SETTIME", "10"]), Reply::integer(10));
        assert_eq!(run(&mut handler, &["GET", "session"]), Reply::nil());
        assert_eq!(run(&mut handler, &["TTL", "session"]), Reply::integer(-2));
        assert_eq!(run(&mut handler, &["DBSIZE"]), Reply::integer(1));
    }

    #[test]
    fn test_ttl_persistent_key() {
        let (mut handler, _) = create_handler();

        run(&mut handler, &["SET", "k", "v"]);
        assert_eq!(run(&mut handler, &["TTL", "k"]), Reply::integer(-1));
    }

    #[test]
    fn test_set_invalid_ttl() {
        let (mut handler, _) = create_handler();

        assert!(run(&mut handler, &["SET", "k", "v", "-1"]).is_error());
        assert!(run(&mut handler, &["SET", "k", "v", "soon"]).is_error());
        assert!(run(&mut handler, &["SET", "k"]).is_error());
        assert_eq!(run(&mut handler, &["GET", "k"]), Reply::nil());
    }

    #[test]
    fn test_del_and_exists() {
        let (mut handler, _) = create_handler();

        run(&mut handler, &["SET", "a", "1"]);
        run(&mut handler, &["SET", "b", "2", "1"]);

        assert_eq!(run(&mut handler, &["EXISTS", "a", "b", "c"]), Reply::integer(2));

        run(&mut handler, &["ADVANCE", "1"]);
        assert_eq!(run(&mut handler, &["EXISTS", "a", "b"]), Reply::integer(1));

        // Expired entries are still deletable
        assert_eq!(run(&mut handler, &["DEL", "a", "b", "c"]), Reply::integer(2));
        assert_eq!(run(&mut handler, &["DEL", "a"]), Reply::integer(0));
    }

    #[test]
    fn test_range() {
        let (mut handler, _) = create_handler();

        for (k, v) in [("a", "1"), ("b", "2"), ("d", "4"), ("e", "5")] {
            run(&mut handler, &["SET", k, v]);
        }

        assert_eq!(
            run(&mut handler, &["RANGE", "c", "2"]),
            bulks(&["d", "4", "e", "5"])
        );
        assert_eq!(run(&mut handler, &["RANGE", "e", "3"]), bulks(&["e", "5"]));
        assert_eq!(run(&mut handler, &["RANGE", "a", "0"]), Reply::array(vec![]));
        assert!(run(&mut handler, &["RANGE", "a", "x"]).is_error());
    }

    #[test]
    fn test_range_count_skips_expired() {
        let (mut handler, _) = create_handler();

        run(&mut handler, &["SET", "a", "1"]);
        run(&mut handler, &["SET", "b", "2", "1"]);
        run(&mut handler, &["SET", "c", "3"]);

        run(&mut handler, &["ADVANCE", "1"]);
        assert_eq!(
            run(&mut handler, &["RANGE", "a", "2"]),
            bulks(&["a", "1", "c", "3"])
        );
    }

    #[test]
    fn test_evict() {
        let (mut handler, _) = create_handler();

        run(&mut handler, &["SET", "c", "3", "2"]);
        run(&mut handler, &["SET", "a", "1", "2"]);
        run(&mut handler, &["SET", "b", "2", "2"]);
        run(&mut handler, &["SET", "z", "forever"]);

        assert_eq!(run(&mut handler, &["EVICT"]), Reply::nil());
        assert_eq!(run(&mut handler, &["NEXTEXPIRY"]), Reply::integer(2));

        run(&mut handler, &["SETTIME", "2"]);
        assert_eq!(run(&mut handler, &["EVICT"]), bulks(&["a", "1"]));
        assert_eq!(run(&mut handler, &["EVICT", "5"]), bulks(&["b", "2", "c", "3"]));
        assert_eq!(run(&mut handler, &["EVICT", "5"]), Reply::array(vec![]));
        assert_eq!(run(&mut handler, &["NEXTEXPIRY"]), Reply::nil());
        assert_eq!(run(&mut handler, &["DBSIZE"]), Reply::integer(1));
    }

    #[test]
    fn test_clock_commands_need_manual_clock() {
        let mut handler = CommandHandler::new(Store::new(|| 77u64));

        assert_eq!(handler.execute(&make_command(&["TIME"])), Reply::integer(77));
        assert!(handler.execute(&make_command(&["ADVANCE", "1"])).is_error());
        assert!(handler.execute(&make_command(&["SETTIME", "1"])).is_error());
    }

    #[test]
    fn test_flushdb_and_info() {
        let (mut handler, _) = create_handler();

        run(&mut handler, &["SET", "a", "1", "5"]);
        let info = run(&mut handler, &["INFO"]).to_string();
        assert!(info.contains("keys:1"));
        assert!(info.contains("expiring_keys:1"));
        assert!(info.contains("next_expiry:5"));
        assert!(info.contains("clock:manual"));

        assert_eq!(run(&mut handler, &["FLUSHDB"]), Reply::ok());
        assert_eq!(run(&mut handler, &["DBSIZE"]), Reply::integer(0));
        assert!(handler.store().is_empty());
    }

    #[test]
    fn test_server_commands_reject_extra_arguments() {
        let (mut handler, _) = create_handler();

        run(&mut handler, &["SET", "a", "1"]);

        for cmd in ["DBSIZE", "FLUSHDB", "INFO", "QUIT"] {
            assert_eq!(
                run(&mut handler, &[cmd, "extra"]),
                Reply::error(format!(
                    "ERR wrong number of arguments for '{}' command",
                    cmd
                ))
            );
        }

        // The rejected FLUSHDB left the data alone
        assert_eq!(run(&mut handler, &["DBSIZE"]), Reply::integer(1));
        assert_eq!(run(&mut handler, &["quit"]), Reply::ok());
    }

    #[test]
    fn test_unknown_and_empty_command() {
        let (mut handler, _) = create_handler();

        assert_eq!(
            run(&mut handler, &["FROB"]),
            Reply::error("ERR unknown command 'FROB'")
        );
        assert!(handler.execute(&[]).is_error());
    }
}
