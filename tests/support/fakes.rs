//! In-memory collaborators.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use vpnpod::core::domain::{Address, Credential, Origin};
use vpnpod::core::orchestrator::{Plan, Prompter};
use vpnpod::core::probe::AddressSource;
use vpnpod::core::readiness::Clock;
use vpnpod::core::runtime::{ContainerSpec, Runtime, RuntimeResult};
use vpnpod::error::{Result, RuntimeError};
use vpnpod::RunState;

use super::fixtures::{ready_logs, PASSWORD, USERNAME};

#[derive(Default)]
struct World {
    calls: Vec<String>,
    pods: BTreeSet<String>,
    /// container name -> pod
    containers: BTreeMap<String, String>,
    /// (container, path) -> contents
    files: BTreeMap<(String, String), Vec<u8>>,
    specs: Vec<ContainerSpec>,
    logs: String,
    failures: BTreeSet<String>,
    not_running_polls: u32,
    shred_missing: bool,
}

/// Container runtime kept in memory.
///
/// Records every call as a short string such as `create pod work` so tests
/// can assert on order.
pub struct FakeRuntime {
    world: Mutex<World>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            world: Mutex::new(World {
                logs: ready_logs(),
                ..World::default()
            }),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    /// Pretend a pod already exists.
    pub fn with_pod(self, name: &str) -> Self {
        self.world().pods.insert(name.to_string());
        self
    }

    /// Pretend a container already exists, outside any pod.
    pub fn with_container(self, name: &str) -> Self {
        self.world()
            .containers
            .insert(name.to_string(), String::new());
        self
    }

    /// Make `operation` on `name` fail, e.g. `fail("run_container", "work-client")`.
    pub fn fail(self, operation: &str, name: &str) -> Self {
        self.world().failures.insert(format!("{} {}", operation, name));
        self
    }

    /// Report containers as not running for the first `polls` checks.
    pub fn not_running_for(self, polls: u32) -> Self {
        self.world().not_running_polls = polls;
        self
    }

    pub fn with_logs(self, logs: &str) -> Self {
        self.world().logs = logs.to_string();
        self
    }

    /// Make `shred` missing inside containers, forcing the dd fallback.
    pub fn without_shred(self) -> Self {
        self.world().shred_missing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.world().calls.clone()
    }

    /// Removal calls in the order they were made.
    pub fn removals(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("remove "))
            .collect()
    }

    /// Creation calls in the order they were made.
    pub fn creations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("create ") || c.starts_with("run "))
            .collect()
    }

    pub fn pods(&self) -> Vec<String> {
        self.world().pods.iter().cloned().collect()
    }

    pub fn containers(&self) -> Vec<String> {
        self.world().containers.keys().cloned().collect()
    }

    pub fn spec(&self, name: &str) -> Option<ContainerSpec> {
        self.world().specs.iter().find(|s| s.name == name).cloned()
    }

    /// Contents of a file inside a container, if present.
    pub fn file(&self, container: &str, path: &str) -> Option<Vec<u8>> {
        self.world()
            .files
            .get(&(container.to_string(), path.to_string()))
            .cloned()
    }

    fn call(&self, call: String) {
        self.world().calls.push(call);
    }

    fn check(&self, operation: &str, name: &str) -> RuntimeResult<()> {
        if self.world().failures.contains(&format!("{} {}", operation, name)) {
            return Err(RuntimeError::new(operation, "injected failure"));
        }
        Ok(())
    }

    fn running(&self, name: &str) -> RuntimeResult<()> {
        if self.world().containers.contains_key(name) {
            Ok(())
        } else {
            Err(RuntimeError::new(
                "exec",
                format!("no such container {}", name),
            ))
        }
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for FakeRuntime {
    fn create_pod(&self, name: &str) -> RuntimeResult<()> {
        self.call(format!("create pod {}", name));
        self.check("create_pod", name)?;
        let mut world = self.world();
        if !world.pods.insert(name.to_string()) {
            return Err(RuntimeError::new("create pod", "pod already exists"));
        }
        Ok(())
    }

    fn remove_pod(&self, name: &str, _force: bool) -> RuntimeResult<()> {
        self.call(format!("remove pod {}", name));
        self.check("remove_pod", name)?;
        let mut world = self.world();
        if !world.pods.remove(name) {
            return Err(RuntimeError::new("remove pod", "no such pod"));
        }
        world.containers.retain(|_, pod| pod != name);
        Ok(())
    }

    fn pod_exists(&self, name: &str) -> RuntimeResult<bool> {
        self.check("pod_exists", name)?;
        Ok(self.world().pods.contains(name))
    }

    fn run_container(&self, spec: &ContainerSpec) -> RuntimeResult<()> {
        self.call(format!("run {}", spec.name));
        self.check("run_container", &spec.name)?;
        let mut world = self.world();
        if !world.pods.contains(&spec.pod) {
            return Err(RuntimeError::new("run container", "no such pod"));
        }
        world.containers.insert(spec.name.clone(), spec.pod.clone());
        world.specs.push(spec.clone());
        Ok(())
    }

    fn exec_in_container(
        &self,
        name: &str,
        command: &[&str],
        _user: Option<&str>,
    ) -> RuntimeResult<String> {
        self.call(format!("exec {} {}", name, command.join(" ")));
        self.check("exec", name)?;
        self.running(name)?;

        let mut world = self.world();
        match command {
            ["chmod", _, path] => {
                let key = (name.to_string(), path.to_string());
                if world.files.contains_key(&key) {
                    Ok(String::new())
                } else {
                    Err(RuntimeError::new("exec", "chmod: no such file"))
                }
            }
            ["shred", .., path] => {
                if world.shred_missing {
                    return Err(RuntimeError::new("exec", "shred: not found"));
                }
                world.files.remove(&(name.to_string(), path.to_string()));
                Ok(String::new())
            }
            ["sh", "-c", _, _, path] => {
                world.files.remove(&(name.to_string(), path.to_string()));
                Ok(String::new())
            }
            _ => Ok(String::new()),
        }
    }

    fn copy_into_container(&self, name: &str, local: &Path, remote: &str) -> RuntimeResult<()> {
        self.call(format!("copy {} {}", name, remote));
        self.check("copy", name)?;
        self.running(name)?;
        let contents =
            std::fs::read(local).map_err(|e| RuntimeError::new("copy", e.to_string()))?;
        self.world()
            .files
            .insert((name.to_string(), remote.to_string()), contents);
        Ok(())
    }

    fn container_exists(&self, name: &str) -> RuntimeResult<bool> {
        self.check("container_exists", name)?;
        Ok(self.world().containers.contains_key(name))
    }

    fn container_running(&self, name: &str) -> RuntimeResult<bool> {
        let mut world = self.world();
        if world.not_running_polls > 0 {
            world.not_running_polls -= 1;
            return Ok(false);
        }
        Ok(world.containers.contains_key(name))
    }

    fn remove_container(&self, name: &str, _force: bool) -> RuntimeResult<()> {
        self.call(format!("remove container {}", name));
        self.check("remove_container", name)?;
        let mut world = self.world();
        if world.containers.remove(name).is_none() {
            return Err(RuntimeError::new("remove container", "no such container"));
        }
        world.files.retain(|(container, _), _| container != name);
        Ok(())
    }

    fn tail_logs(&self, name: &str, lines: usize) -> RuntimeResult<String> {
        self.check("logs", name)?;
        let world = self.world();
        let all: Vec<&str> = world.logs.lines().collect();
        let start = all.len().saturating_sub(lines);
        Ok(all[start..].join("\n"))
    }
}

/// Address source answering from a fixed script.
pub struct ScriptedProbe {
    host: Mutex<Address>,
    gateway: Mutex<Address>,
    client: Mutex<Address>,
    queries: Mutex<Vec<Origin>>,
}

impl ScriptedProbe {
    /// Host leaves through `host`, gateway and client through `tunnel`.
    pub fn tunnel(host: &str, tunnel: &str) -> Self {
        Self {
            host: Mutex::new(Address::Resolved(host.to_string())),
            gateway: Mutex::new(Address::Resolved(tunnel.to_string())),
            client: Mutex::new(Address::Resolved(tunnel.to_string())),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_host(&self, address: Address) {
        *self.host.lock().unwrap() = address;
    }

    pub fn set_gateway(&self, address: Address) {
        *self.gateway.lock().unwrap() = address;
    }

    pub fn set_client(&self, address: Address) {
        *self.client.lock().unwrap() = address;
    }

    pub fn queries(&self) -> Vec<Origin> {
        self.queries.lock().unwrap().clone()
    }
}

impl AddressSource for ScriptedProbe {
    fn external_address(&self, origin: &Origin) -> Address {
        self.queries.lock().unwrap().push(origin.clone());
        match origin {
            Origin::Host => self.host.lock().unwrap().clone(),
            Origin::Container { name, .. } if name.ends_with("-vpn") => {
                self.gateway.lock().unwrap().clone()
            }
            Origin::Container { .. } => self.client.lock().unwrap().clone(),
        }
    }
}

/// Prompter with canned answers.
pub struct ScriptedPrompter {
    pub username: String,
    pub password: String,
    pub vpn_config: PathBuf,
    pub pod: String,
    pub confirm: bool,
    confirmations: AtomicU32,
}

impl ScriptedPrompter {
    pub fn new(pod: &str, vpn_config: PathBuf) -> Self {
        Self {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            vpn_config,
            pod: pod.to_string(),
            confirm: true,
            confirmations: AtomicU32::new(0),
        }
    }

    /// How many times the confirmation gate was reached.
    pub fn confirmations(&self) -> u32 {
        self.confirmations.load(Ordering::SeqCst)
    }
}

impl Prompter for ScriptedPrompter {
    fn credentials(&self) -> Result<Credential> {
        Credential::new(self.username.as_str(), self.password.as_str())
    }

    fn vpn_config_path(&self) -> Result<PathBuf> {
        Ok(self.vpn_config.clone())
    }

    fn pod_name(&self) -> Result<String> {
        Ok(self.pod.clone())
    }

    fn confirm(&self, _plan: &Plan) -> Result<bool> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        Ok(self.confirm)
    }
}

/// Clock that never blocks, and can deliver an interrupt mid-wait.
pub struct FakeClock {
    sleeps: AtomicU32,
    slept: Mutex<Duration>,
    trigger: Mutex<Option<(Arc<RunState>, u32)>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            sleeps: AtomicU32::new(0),
            slept: Mutex::new(Duration::ZERO),
            trigger: Mutex::new(None),
        }
    }

    /// Interrupt `state` during the `after`-th sleep.
    pub fn interrupt_after(&self, state: Arc<RunState>, after: u32) {
        *self.trigger.lock().unwrap() = Some((state, after));
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total simulated time.
    pub fn slept(&self) -> Duration {
        *self.slept.lock().unwrap()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn sleep(&self, duration: Duration) {
        let count = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
        *self.slept.lock().unwrap() += duration;

        if let Some((state, after)) = self.trigger.lock().unwrap().as_ref() {
            if count >= *after {
                state.interrupt();
            }
        }
    }
}
