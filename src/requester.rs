//! Single-url request execution with bounded retries
//!
//! Transport failures (timeouts, refused connections, dns errors, ...) are retried and then
//! silently dropped. Nothing in here returns an error to the caller; every outcome is
//! described by [`Outcome`].

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{redirect::Policy, Client};

use crate::{DEFAULT_RETRIES, DEFAULT_STATUS_CODES, DEFAULT_TIMEOUT};

/// Result of executing a request against a single target url
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// status code was in the match set
    Match { status: u16, attempts: usize },

    /// a response came back, but its status isn't interesting
    NoMatch { status: u16, attempts: usize },

    /// every attempt failed at the transport level
    Exhausted { attempts: usize },
}

impl Outcome {
    /// number of attempts made before reaching this outcome
    pub fn attempts(&self) -> usize {
        match self {
            Outcome::Match { attempts, .. }
            | Outcome::NoMatch { attempts, .. }
            | Outcome::Exhausted { attempts } => *attempts,
        }
    }

    /// status code of the matching response, if this is a match
    pub fn matched(&self) -> Option<u16> {
        match self {
            Outcome::Match { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Create and return an instance of [reqwest::Client](https://docs.rs/reqwest/latest/reqwest/struct.Client.html)
///
/// timeouts are applied per request by the [`Requester`], not here
pub fn initialize_client(user_agent: &str, redirects: bool) -> Result<Client> {
    let policy = if redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };

    Client::builder()
        .user_agent(user_agent)
        .redirect(policy)
        .build()
        .with_context(|| "Could not build the http client")
}

/// Issues GET requests and classifies the response against the match set
#[derive(Debug, Clone)]
pub struct Requester {
    client: Client,
    match_codes: HashSet<u16>,
    timeout: Duration,
    retries: usize,
}

impl Requester {
    /// create a requester with the default timeout and retry count
    pub fn new(client: Client, match_codes: &[u16]) -> Self {
        Self {
            client,
            match_codes: match_codes.iter().copied().collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
            retries: DEFAULT_RETRIES,
        }
    }

    /// per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// total number of attempts per url; a value of 0 is treated as 1
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// whether the given status code is one we're looking for
    pub fn is_match(&self, status: u16) -> bool {
        self.match_codes.contains(&status)
    }

    /// GET `url`, retrying transport failures up to the configured number of attempts
    pub async fn execute(&self, url: &str) -> Outcome {
        log::trace!("enter: execute({url})");

        for attempt in 1..=self.retries {
            match self.client.get(url).timeout(self.timeout).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    let outcome = if self.is_match(status) {
                        Outcome::Match {
                            status,
                            attempts: attempt,
                        }
                    } else {
                        Outcome::NoMatch {
                            status,
                            attempts: attempt,
                        }
                    };

                    log::trace!("exit: execute -> {outcome:?}");
                    return outcome;
                }
                Err(e) if e.is_builder() => {
                    // the url itself is unusable, another attempt won't change that
                    log::debug!("could not build a request for {url}: {e}");
                    return Outcome::Exhausted { attempts: attempt };
                }
                Err(e) if e.is_timeout() => {
                    log::debug!("{url} timed out ({attempt}/{})", self.retries);
                }
                Err(e) => {
                    log::debug!("{url} failed ({attempt}/{}): {e}", self.retries);
                }
            }
        }

        log::trace!("exit: execute -> exhausted");
        Outcome::Exhausted {
            attempts: self.retries,
        }
    }
}

impl Default for Requester {
    fn default() -> Self {
        Self::new(Client::new(), &DEFAULT_STATUS_CODES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// default requester matches the default status codes and nothing else
    fn default_match_codes() {
        let requester = Requester::default();

        for code in DEFAULT_STATUS_CODES {
            assert!(requester.is_match(code));
        }
        assert!(!requester.is_match(404));
        assert!(!requester.is_match(401));
    }

    #[test]
    /// zero retries still means one attempt
    fn retries_floor_is_one() {
        let requester = Requester::default().retries(0);
        assert_eq!(requester.retries, 1);
    }

    #[test]
    /// attempts and matched status are reported from every variant
    fn outcome_accessors() {
        let hit = Outcome::Match {
            status: 200,
            attempts: 2,
        };
        assert_eq!(hit.attempts(), 2);
        assert_eq!(hit.matched(), Some(200));

        let miss = Outcome::NoMatch {
            status: 404,
            attempts: 1,
        };
        assert_eq!(miss.matched(), None);

        assert_eq!(Outcome::Exhausted { attempts: 3 }.attempts(), 3);
    }

    #[tokio::test]
    /// a refused connection is retried and then given up on without an error
    async fn execute_refused_connection_is_exhausted() {
        // bind then drop to get a port nothing is listening on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let requester = Requester::default()
            .timeout(Duration::from_millis(500))
            .retries(2);

        let outcome = requester
            .execute(&format!("http://127.0.0.1:{port}/admin"))
            .await;

        assert_eq!(outcome, Outcome::Exhausted { attempts: 2 });
    }

    #[tokio::test]
    /// an unparsable url gives up after a single attempt
    async fn execute_invalid_url_gives_up_immediately() {
        let requester = Requester::default();
        let outcome = requester.execute("not a url").await;
        assert_eq!(outcome, Outcome::Exhausted { attempts: 1 });
    }
}
