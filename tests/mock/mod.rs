//! In-memory FTP backend for driving the gateway without a network.
//! Every connection, command and logout is recorded.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::rc::Rc;

use ftp_gateway::control::{ControlConnection, Connector};
use ftp_gateway::BackendError;

pub const ADMIN: &str = "ezaz";
pub const ADMIN_PASSWORD: &str = "password123";

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug)]
struct State {
    nodes: BTreeMap<String, Node>,
    mlsd_supported: bool,
    refuse: Option<BackendError>,
    fail_stor: bool,
    commands: Vec<String>,
    connects: usize,
    quits: usize,
    open: usize,
}

/// Shared handle: the gateway owns one clone, the test keeps another.
#[derive(Clone)]
pub struct MockServer {
    state: Rc<RefCell<State>>,
}

pub struct MockConnection {
    state: Rc<RefCell<State>>,
    user: Option<String>,
    cwd: String,
}

fn reply(code: u32, message: &str) -> BackendError {
    BackendError::Reply { code, message: message.to_string() }
}

fn resolve(cwd: &str, arg: &str) -> String {
    let mut segments: Vec<&str> = if arg.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in arg.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), Node::Dir);
        MockServer {
            state: Rc::new(RefCell::new(State {
                nodes,
                mlsd_supported: true,
                refuse: None,
                fail_stor: false,
                commands: Vec::new(),
                connects: 0,
                quits: 0,
                open: 0,
            })),
        }
    }

    pub fn with_dir(self, path: &str) -> MockServer {
        self.state.borrow_mut().nodes.insert(path.to_string(), Node::Dir);
        self
    }

    pub fn with_file(self, path: &str, content: &[u8]) -> MockServer {
        self.state
            .borrow_mut()
            .nodes
            .insert(path.to_string(), Node::File(content.to_vec()));
        self
    }

    pub fn without_mlsd(self) -> MockServer {
        self.state.borrow_mut().mlsd_supported = false;
        self
    }

    /// Every connection attempt fails with `err`.
    pub fn refusing(self, err: BackendError) -> MockServer {
        self.state.borrow_mut().refuse = Some(err);
        self
    }

    pub fn failing_stor(self) -> MockServer {
        self.state.borrow_mut().fail_stor = true;
        self
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    pub fn quits(&self) -> usize {
        self.state.borrow().quits
    }

    /// Connections not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.state.borrow().open
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.borrow().nodes.contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.borrow().nodes.get(path) {
            Some(&Node::File(ref data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Every connection opened so far was logged out and dropped.
    pub fn assert_all_closed(&self) {
        let state = self.state.borrow();
        assert_eq!(state.open, 0, "connection leaked");
        assert_eq!(state.quits, state.connects, "connection not logged out");
    }
}

impl Connector for MockServer {
    type Connection = MockConnection;

    fn connect(&self) -> Result<MockConnection, BackendError> {
        let mut state = self.state.borrow_mut();
        if let Some(ref err) = state.refuse {
            return Err(match *err {
                BackendError::Reply { code, ref message } => reply(code, message),
                ref other => BackendError::Protocol(other.to_string()),
            });
        }
        state.connects += 1;
        state.open += 1;
        Ok(MockConnection {
            state: self.state.clone(),
            user: None,
            cwd: String::new(),
        })
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.borrow_mut().open -= 1;
    }
}

impl MockConnection {
    fn record(&self, command: String) {
        self.state.borrow_mut().commands.push(command);
    }

    fn require_login(&self) -> Result<(), BackendError> {
        match self.user {
            Some(_) => Ok(()),
            None => Err(reply(530, "Log in with USER and PASS first.")),
        }
    }

    fn require_write(&self) -> Result<(), BackendError> {
        self.require_login()?;
        match self.user.as_deref() {
            Some(ADMIN) => Ok(()),
            _ => Err(reply(550, "Not enough privileges.")),
        }
    }

    fn dir_path(&self, path: Option<&str>) -> Result<String, BackendError> {
        let target = resolve(&self.cwd, path.unwrap_or("."));
        match self.state.borrow().nodes.get(&target) {
            Some(&Node::Dir) => Ok(target),
            _ => Err(reply(550, "No such file or directory.")),
        }
    }

    fn children(&self, dir: &str) -> Vec<(String, Node)> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|&(path, _)| !path.is_empty() && parent_of(path) == dir)
            .map(|(path, node)| (name_of(path).to_string(), node.clone()))
            .collect()
    }
}

impl ControlConnection for MockConnection {
    fn login(&mut self, user: &str, password: &str) -> Result<(), BackendError> {
        self.record(format!("USER {}", user));
        let accepted = user == "anonymous" || (user == ADMIN && password == ADMIN_PASSWORD);
        if !accepted {
            return Err(reply(530, "Authentication failed."));
        }
        self.user = Some(user.to_string());
        Ok(())
    }

    fn mlsd(&mut self, path: Option<&str>) -> Result<Vec<String>, BackendError> {
        self.record(format!("MLSD {}", path.unwrap_or("")).trim_end().to_string());
        self.require_login()?;
        if !self.state.borrow().mlsd_supported {
            return Err(reply(502, "Command not implemented."));
        }
        let dir = self.dir_path(path)?;
        let mut lines = vec![
            "type=cdir;modify=20240101000000; .".to_string(),
            "type=pdir;modify=20240101000000; ..".to_string(),
        ];
        for (name, node) in self.children(&dir) {
            lines.push(match node {
                Node::Dir => format!("type=dir;modify=20240101120000; {}", name),
                Node::File(data) => format!("type=file;size={};modify=20240102093000; {}", data.len(), name),
            });
        }
        Ok(lines)
    }

    fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, BackendError> {
        self.record(format!("LIST {}", path.unwrap_or("")).trim_end().to_string());
        self.require_login()?;
        let dir = self.dir_path(path)?;
        let children = self.children(&dir);
        let mut lines = vec![format!("total {}", children.len())];
        for (name, node) in children {
            lines.push(match node {
                Node::Dir => format!("drwxr-xr-x   2 ftp      ftp          4096 Jan 01 12:00 {}", name),
                Node::File(data) => format!("-rw-r--r--   1 ftp      ftp    {:>10} Jan 02 09:30 {}", data.len(), name),
            });
        }
        Ok(lines)
    }

    fn cwd(&mut self, path: &str) -> Result<(), BackendError> {
        self.record(format!("CWD {}", path));
        self.require_login()?;
        self.cwd = self.dir_path(Some(path))?;
        Ok(())
    }

    fn mkdir(&mut self, name: &str) -> Result<(), BackendError> {
        self.record(format!("MKD {}", name));
        self.require_write()?;
        let target = resolve(&self.cwd, name);
        let mut state = self.state.borrow_mut();
        if state.nodes.contains_key(&target) {
            return Err(reply(550, "File exists."));
        }
        match state.nodes.get(parent_of(&target)) {
            Some(&Node::Dir) => {}
            _ => return Err(reply(550, "No such file or directory.")),
        }
        state.nodes.insert(target, Node::Dir);
        Ok(())
    }

    fn rm(&mut self, path: &str) -> Result<(), BackendError> {
        self.record(format!("DELE {}", path));
        self.require_write()?;
        let target = resolve(&self.cwd, path);
        let mut state = self.state.borrow_mut();
        match state.nodes.get(&target) {
            Some(&Node::File(_)) => {
                state.nodes.remove(&target);
                Ok(())
            }
            _ => Err(reply(550, "No such file or directory.")),
        }
    }

    fn rmdir(&mut self, path: &str) -> Result<(), BackendError> {
        self.record(format!("RMD {}", path));
        self.require_write()?;
        let target = resolve(&self.cwd, path);
        if target.is_empty() {
            return Err(reply(550, "Can't remove root directory."));
        }
        match self.state.borrow().nodes.get(&target) {
            Some(&Node::Dir) => {}
            _ => return Err(reply(550, "No such file or directory.")),
        }
        if !self.children(&target).is_empty() {
            return Err(reply(550, "Directory not empty."));
        }
        self.state.borrow_mut().nodes.remove(&target);
        Ok(())
    }

    fn put(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, BackendError> {
        self.record(format!("STOR {}", name));
        self.require_write()?;
        if self.state.borrow().fail_stor {
            return Err(reply(552, "Requested file action aborted. Exceeded storage allocation."));
        }
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(BackendError::Connection)?;
        let size = data.len() as u64;
        let target = resolve(&self.cwd, name);
        self.state.borrow_mut().nodes.insert(target, Node::File(data));
        Ok(size)
    }

    fn retr(&mut self, path: &str, writer: &mut dyn Write) -> Result<u64, BackendError> {
        self.record(format!("RETR {}", path));
        self.require_login()?;
        let target = resolve(&self.cwd, path);
        let data = match self.state.borrow().nodes.get(&target) {
            Some(&Node::File(ref data)) => data.clone(),
            _ => return Err(reply(550, "No such file or directory.")),
        };
        writer.write_all(&data).map_err(BackendError::Connection)?;
        Ok(data.len() as u64)
    }

    fn quit(&mut self) -> Result<(), BackendError> {
        self.record("QUIT".to_string());
        self.state.borrow_mut().quits += 1;
        Ok(())
    }
}
