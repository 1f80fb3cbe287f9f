//! Recording fake collaborators for probe lifecycle tests.
//!
//! The fakes script each lifecycle phase and record call counts plus the
//! order of events, so tests can assert both outcomes and resource-cleanup
//! guarantees (exactly one close per opened connection, exactly one destroy
//! per created ticket client).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mssql_probe::{
    AuthError, Connection, ConnectionDescriptor, Credentials, Driver, DriverError, RealmConfig,
    RowOutcome, TicketClient, TicketClientFactory,
};

/// Shared call recorder.
#[derive(Default)]
pub struct Calls {
    pub opens: AtomicUsize,
    pub pings: AtomicUsize,
    pub queries: AtomicUsize,
    pub closes: AtomicUsize,
    pub logins: AtomicUsize,
    pub destroys: AtomicUsize,
    events: Mutex<Vec<&'static str>>,
}

impl Calls {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, counter: &AtomicUsize, event: &'static str) {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[derive(Clone, Copy)]
pub enum OpenScript {
    Ok,
    Refused,
}

#[derive(Clone, Copy)]
pub enum PingScript {
    Ok,
    Fail,
    Hang,
}

#[derive(Clone, Copy)]
pub enum QueryScript {
    Row,
    Empty,
    ExecuteFail,
    RowReadFail,
    Hang,
}

/// Scripted driver; every opened connection shares the recorder.
pub struct FakeDriver {
    pub open: OpenScript,
    pub ping: PingScript,
    pub query: QueryScript,
    pub calls: Arc<Calls>,
}

impl FakeDriver {
    pub fn reachable(calls: &Arc<Calls>) -> Self {
        Self {
            open: OpenScript::Ok,
            ping: PingScript::Ok,
            query: QueryScript::Row,
            calls: Arc::clone(calls),
        }
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn open(
        &self,
        _descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, DriverError> {
        self.calls.record(&self.calls.opens, "open");
        match self.open {
            OpenScript::Ok => Ok(Box::new(FakeConnection {
                ping: self.ping,
                query: self.query,
                calls: Arc::clone(&self.calls),
            })),
            OpenScript::Refused => Err(DriverError::Connect("connection refused".into())),
        }
    }
}

struct FakeConnection {
    ping: PingScript,
    query: QueryScript,
    calls: Arc<Calls>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn ping(&mut self) -> Result<(), DriverError> {
        self.calls.record(&self.calls.pings, "ping");
        match self.ping {
            PingScript::Ok => Ok(()),
            PingScript::Fail => Err(DriverError::Ping("login failed for user".into())),
            PingScript::Hang => std::future::pending().await,
        }
    }

    async fn query_first_row(&mut self, _sql: &str) -> Result<RowOutcome, DriverError> {
        self.calls.record(&self.calls.queries, "query");
        match self.query {
            QueryScript::Row => Ok(RowOutcome::Row),
            QueryScript::Empty => Ok(RowOutcome::Empty),
            QueryScript::ExecuteFail => Err(DriverError::Execute("invalid object name".into())),
            QueryScript::RowReadFail => Err(DriverError::RowRead("stream interrupted".into())),
            QueryScript::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.calls.record(&self.calls.closes, "close");
        Ok(())
    }
}

/// Scripted ticket-client factory sharing the same recorder.
pub struct FakeTicketFactory {
    pub login_ok: bool,
    pub calls: Arc<Calls>,
}

impl FakeTicketFactory {
    pub fn accepting(calls: &Arc<Calls>) -> Arc<Self> {
        Arc::new(Self {
            login_ok: true,
            calls: Arc::clone(calls),
        })
    }

    pub fn rejecting(calls: &Arc<Calls>) -> Arc<Self> {
        Arc::new(Self {
            login_ok: false,
            calls: Arc::clone(calls),
        })
    }
}

impl TicketClientFactory for FakeTicketFactory {
    fn create(
        &self,
        _realm: &RealmConfig,
        _credentials: &Credentials,
        _spn: &str,
    ) -> Result<Box<dyn TicketClient>, AuthError> {
        Ok(Box::new(FakeTicketClient {
            login_ok: self.login_ok,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct FakeTicketClient {
    login_ok: bool,
    calls: Arc<Calls>,
}

#[async_trait]
impl TicketClient for FakeTicketClient {
    async fn login(&mut self) -> Result<(), AuthError> {
        self.calls.record(&self.calls.logins, "login");
        if self.login_ok {
            Ok(())
        } else {
            Err(AuthError::KerberosLoginFailed(
                "KDC rejected pre-authentication".into(),
            ))
        }
    }

    fn destroy(&mut self) {
        self.calls.record(&self.calls.destroys, "destroy");
    }
}

/// A valid realm-file configuration with the given validation query.
pub fn realm_file_config(query: &str) -> String {
    format!(
        r#"{{
            "target": "db.example.com",
            "port": 1433,
            "username": "svc",
            "password": "pw",
            "database": "scoring",
            "domain": "EXAMPLE.COM",
            "krbpath": "/etc/krb5.conf",
            "query": {query:?}
        }}"#
    )
}

/// A valid explicit-login configuration with the given validation query.
pub fn explicit_login_config(query: &str) -> String {
    format!(
        r#"{{
            "target": "db.example.com",
            "port": 1433,
            "username": "svc",
            "password": "pw",
            "database": "scoring",
            "domain": "EXAMPLE.COM",
            "kdcserver": "kdc.example.com",
            "inline_realm": true,
            "query": {query:?}
        }}"#
    )
}
