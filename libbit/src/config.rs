//! A small INI-with-subsections parser, good enough for the keys bit actually
//! reads and writes (`core.*`, `user.*`, `remote.<name>.*`, `branch.<name>.*`).
//! Not a general git-config implementation: no includes, no `[section.sub]`
//! dotted form, no multi-valued keys beyond what `remote_configs` needs.

use crate::error::{BitGenericError, BitResult};
use crate::interner::Intern;
use crate::remote::Refspec;
use crate::repo::BitRepo;
use git_url_parse::GitUrl;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

lazy_static! {
    static ref GLOBAL_PATH: PathBuf = dirs::home_dir().unwrap().join(".gitconfig");
}

#[derive(Debug, Copy, Clone)]
pub enum BitConfigScope {
    Global,
    Local,
}

/// One `[section]` or `[section "subsection"]` block and its `key = value` entries.
#[derive(Debug, Clone, Default)]
struct IniSection {
    name: String,
    subsection: Option<String>,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn matches(&self, name: &str, subsection: Option<&str>) -> bool {
        self.name.eq_ignore_ascii_case(name) && self.subsection.as_deref() == subsection
    }
}

/// An in-memory representation of a config file, reparsed and rewritten in
/// full on every write (config files are small and writes are rare).
#[derive(Debug, Clone, Default)]
struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    fn parse(s: &str) -> Self {
        let mut doc = Self::default();
        let mut current: Option<IniSection> = None;
        for raw_line in s.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(header) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                if let Some(section) = current.take() {
                    doc.sections.push(section);
                }
                let (name, subsection) = match header.split_once(' ') {
                    Some((name, rest)) => {
                        let sub = rest.trim().trim_matches('"').to_owned();
                        (name.trim().to_owned(), Some(sub))
                    }
                    None => (header.trim().to_owned(), None),
                };
                current = Some(IniSection { name, subsection, entries: Vec::new() });
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_owned();
                let value = value.trim().trim_matches('"').to_owned();
                if let Some(section) = current.as_mut() {
                    section.entries.push((key, value));
                }
            }
        }
        if let Some(section) = current.take() {
            doc.sections.push(section);
        }
        doc
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            match &section.subsection {
                Some(sub) => out.push_str(&format!("[{} \"{}\"]\n", section.name, sub)),
                None => out.push_str(&format!("[{}]\n", section.name)),
            }
            for (key, value) in &section.entries {
                out.push_str(&format!("\t{} = {}\n", key, value));
            }
        }
        out
    }

    fn get(&self, name: &str, subsection: Option<&str>, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .filter(|s| s.matches(name, subsection))
            .flat_map(|s| s.entries.iter())
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, name: &str, subsection: Option<&str>, key: &str, value: &str) {
        if let Some(section) = self.sections.iter_mut().find(|s| s.matches(name, subsection)) {
            if let Some(entry) = section.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
                entry.1 = value.to_owned();
                return;
            }
            section.entries.push((key.to_owned(), value.to_owned()));
            return;
        }
        self.sections.push(IniSection {
            name: name.to_owned(),
            subsection: subsection.map(ToOwned::to_owned),
            entries: vec![(key.to_owned(), value.to_owned())],
        });
    }

    fn subsection_exists(&self, name: &str, subsection: &str) -> bool {
        self.sections.iter().any(|s| s.matches(name, Some(subsection)))
    }

    fn remove_subsection(&mut self, name: &str, subsection: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| !s.matches(name, Some(subsection)));
        self.sections.len() != before
    }

    fn subsections(&self, name: &str) -> impl Iterator<Item = (&str, &IniSection)> {
        self.sections
            .iter()
            .filter(move |s| s.name.eq_ignore_ascii_case(name))
            .filter_map(|s| s.subsection.as_deref().map(|sub| (sub, s)))
    }
}

pub struct BitConfig<'c> {
    inner: IniDocument,
    scope: BitConfigScope,
    path: PathBuf,
    _marker: std::marker::PhantomData<&'c ()>,
}

// this struct provides convenient access to each setting
// e.g. to access filemode, we can just write repo.config().filemode()
pub struct Config<'rcx> {
    repo: BitRepo<'rcx>,
}

impl<'rcx> BitRepo<'rcx> {
    pub fn config(self) -> Config<'rcx> {
        Config { repo: self }
    }

    pub fn with_config<R>(
        self,
        scope: BitConfigScope,
        f: impl FnOnce(&mut BitConfig<'_>) -> BitResult<R>,
    ) -> BitResult<R> {
        match scope {
            BitConfigScope::Global => BitConfig::with_global_config(f),
            BitConfigScope::Local => self.with_local_config(f),
        }
    }

    pub fn with_local_config<R>(
        self,
        f: impl for<'c> FnOnce(&mut BitConfig<'c>) -> BitResult<R>,
    ) -> BitResult<R> {
        BitConfig::with_local(self.config_path(), f)
    }

    /// Like [`Self::with_local_config`], but named separately as the entry
    /// point for subsection-aware callers (remotes, branches) that don't go
    /// through the generated per-key accessors below.
    pub fn with_raw_local_config<R>(
        self,
        f: impl for<'c> FnOnce(&mut BitConfig<'c>) -> BitResult<R>,
    ) -> BitResult<R> {
        self.with_local_config(f)
    }

    /// All configured remotes, keyed by interned name. Panics on an unreadable
    /// or unparseable local config, consistent with the per-key accessors below.
    pub fn remote_config(self) -> IndexMap<&'static str, RemoteConfig> {
        self.with_local_config(|config| Ok(config.remote_configs()))
            .unwrap_or_else(|err| panic!("failed to read remote config: {}", err))
    }
}

fn with_config<R>(
    scope: BitConfigScope,
    path: impl AsRef<Path>,
    f: impl for<'a> FnOnce(&mut BitConfig<'a>) -> BitResult<R>,
) -> BitResult<R> {
    let path = path.as_ref().to_path_buf();
    if !path.exists() {
        File::create(&path)?;
    }
    let s = std::fs::read_to_string(&path)?;
    let inner = IniDocument::parse(&s);

    let mut config = BitConfig { inner, path, scope, _marker: std::marker::PhantomData };
    let ret = f(&mut config)?;
    Ok(ret)
}

impl<'c> BitConfig<'c> {
    /// write the configuration to disk
    fn write(&self) -> BitResult<()> {
        let rendered = self.inner.render();
        let mut file = File::with_options().write(true).truncate(true).open(&self.path)?;
        file.write_all(rendered.as_bytes())?;
        Ok(())
    }

    pub fn with_local<R>(
        path: impl AsRef<Path>,
        f: impl FnOnce(&mut BitConfig<'_>) -> BitResult<R>,
    ) -> BitResult<R> {
        with_config(BitConfigScope::Local, path, f)
    }

    fn with_global_config<R>(f: impl FnOnce(&mut BitConfig<'_>) -> BitResult<R>) -> BitResult<R> {
        with_config(BitConfigScope::Global, GLOBAL_PATH.as_path(), f)
    }
}

pub trait BitConfigValue: Sized {
    fn get(s: &str) -> BitResult<Self>;
}

impl BitConfigValue for String {
    fn get(s: &str) -> BitResult<Self> {
        Ok(s.to_owned())
    }
}

impl BitConfigValue for i64 {
    fn get(s: &str) -> BitResult<Self> {
        s.parse()
            .map_err(|err| anyhow!("failed to parse config value as integer `{}`: {}", s, err))
    }
}

impl BitConfigValue for bool {
    fn get(s: &str) -> BitResult<Self> {
        match s {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => bail!("failed to parse config value as boolean `{}`", other),
        }
    }
}

impl<'c> BitConfig<'c> {
    pub fn get<T: BitConfigValue>(&self, section: &str, key: &str) -> BitResult<Option<T>> {
        self.inner.get(section, None, key).map(T::get).transpose()
    }

    pub fn set(&mut self, section_name: &str, key: &str, value: impl ToString) -> BitResult<()> {
        self.inner.set(section_name, None, key, &value.to_string());
        self.write()
    }

    pub fn subsection_exists(&self, section: &str, subsection: &str) -> bool {
        self.inner.subsection_exists(section, subsection)
    }

    pub fn set_subsection(
        &mut self,
        section: &str,
        subsection: &str,
        key: &str,
        value: impl ToString,
    ) -> BitResult<()> {
        self.inner.set(section, Some(subsection), key, &value.to_string());
        self.write()
    }

    /// Returns whether a subsection existed to be removed.
    pub fn remove_subsection(&mut self, section: &str, subsection: &str) -> bool {
        let removed = self.inner.remove_subsection(section, subsection);
        if removed {
            self.write().unwrap_or_else(|err| panic!("failed to write bitconfig: {}", err));
        }
        removed
    }

    fn remote_configs(&self) -> IndexMap<&'static str, RemoteConfig> {
        self.inner
            .subsections("remote")
            .filter_map(|(name, section)| {
                let url = section.entries.iter().find(|(k, _)| k == "url")?.1.as_str();
                let fetch = section
                    .entries
                    .iter()
                    .find(|(k, _)| k == "fetch")
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("+refs/heads/*:refs/remotes/origin/*");
                let url = GitUrl::parse(url).ok()?;
                let fetch = Refspec::from_str(fetch).ok()?;
                Some((name.intern(), RemoteConfig { url, fetch }))
            })
            .collect()
    }
}

/// The `[remote "<name>"]` section, resolved into typed values.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: GitUrl,
    pub fetch: Refspec,
}

/// generates accessors for each property
/// searches up into global scope if the property is not found locally returning None
// if none of the configurations contain the value
macro_rules! get_opt {
    ($section:ident.$field:ident:$ty:ty) => {
        impl Config<'_> {
            pub fn $field(&self) -> BitResult<Option<$ty>> {
                self.repo.with_local_config(|config| config.$field())
            }
        }

        impl<'c> BitConfig<'c> {
            pub fn $field(&self) -> BitResult<Option<$ty>> {
                let section = stringify!($section);
                let field = stringify!($field);
                match self.get(section, field)? {
                    Some(value) => return Ok(Some(value)),
                    None => match self.scope {
                        BitConfigScope::Global => Ok(None),
                        BitConfigScope::Local => Self::with_global_config(|global| global.$field()),
                    },
                }
            }
        }
    };
}

macro_rules! get {
    ($section:ident.$field:ident:$ty:ty, $default:expr) => {
        impl Config<'_> {
            pub fn $field(&self) -> BitResult<$ty> {
                self.repo.with_local_config(|config| config.$field())
            }
        }

        impl<'c> BitConfig<'c> {
            pub fn $field(&self) -> BitResult<$ty> {
                let section = stringify!($section);
                let field = stringify!($field);
                match self.get(section, field)? {
                    Some(value) => return Ok(value),
                    None => match self.scope {
                        BitConfigScope::Global => Ok($default),
                        BitConfigScope::Local => Self::with_global_config(|global| global.$field()),
                    },
                }
            }
        }
    };
}

get!(core.filemode: bool, false);
get!(core.pager: String, "less".to_owned());

get_opt!(core.repositoryformatversion: i64);
get_opt!(core.bare: bool);
get_opt!(user.name: String);
get_opt!(user.email: String);
get_opt!(http.proxy: String);
get_opt!(http.corsproxy: String);
