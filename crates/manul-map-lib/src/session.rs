use crate::LoadError;
use crate::loader::GeoData;
use crate::scene::Scene;

/// Lifecycle of one map session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Loading,
    Ready,
    /// Terminal, there is no automatic retry
    LoadFailed,
}

/// Tracks the load of the map data and holds the failure, if any
#[derive(Debug, Clone)]
pub struct MapSession {
    state: SessionState,
    failure: Option<LoadError>,
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Init,
            failure: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move from `Init` to `Loading`; false in any other state
    pub fn begin_loading(&mut self) -> bool {
        if self.state != SessionState::Init {
            return false;
        }
        self.state = SessionState::Loading;
        tracing::info!("Loading map data");
        true
    }

    /// Finish loading
    ///
    /// On success the scene is built and returned. On failure the error is
    /// kept for the notice and no scene is produced. Outside of `Loading`
    /// the outcome is ignored.
    pub fn complete(&mut self, outcome: Result<GeoData, LoadError>) -> Option<Scene> {
        if self.state != SessionState::Loading {
            tracing::warn!(state = ?self.state, "Ignoring load result outside of loading");
            return None;
        }
        match outcome {
            Ok(data) => {
                let scene = Scene::build(data);
                self.state = SessionState::Ready;
                tracing::info!(features = scene.features().len(), "Map data ready");
                Some(scene)
            }
            Err(err) => {
                tracing::error!("Map data failed to load: {err}");
                self.failure = Some(err);
                self.state = SessionState::LoadFailed;
                None
            }
        }
    }

    pub fn failure(&self) -> Option<&LoadError> {
        self.failure.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::sample_data;

    #[test]
    fn test_happy_path() {
        let mut session = MapSession::new();
        assert_eq!(session.state(), SessionState::Init);
        assert!(session.begin_loading());
        assert!(!session.begin_loading());
        let scene = session.complete(Ok(sample_data())).unwrap();
        assert_eq!(scene.features().len(), 5);
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.failure().is_none());
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut session = MapSession::new();
        session.begin_loading();
        let err = LoadError::Fetch {
            url: "data/range.json".into(),
            reason: "HTTP 404".into(),
        };
        assert!(session.complete(Err(err.clone())).is_none());
        assert_eq!(session.state(), SessionState::LoadFailed);
        assert_eq!(session.failure(), Some(&err));

        assert!(!session.begin_loading());
        assert!(session.complete(Ok(sample_data())).is_none());
        assert_eq!(session.state(), SessionState::LoadFailed);
    }

    #[test]
    fn test_complete_before_loading_is_ignored() {
        let mut session = MapSession::new();
        assert!(session.complete(Ok(sample_data())).is_none());
        assert_eq!(session.state(), SessionState::Init);
    }
}
