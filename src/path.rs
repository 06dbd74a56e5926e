use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A `/`-separated position in the type namespace, such as `/obj/item`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TypePath {
    pub is_absolute: bool,
    pub segments: Vec<String>,
}

impl TypePath {
    /// The absolute root path `/`.
    pub fn root() -> Self {
        Self {
            is_absolute: true,
            segments: Vec::new(),
        }
    }

    /// The empty relative path.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn relative<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            is_absolute: false,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn absolute<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            is_absolute: true,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.is_absolute && self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.is_absolute && self.segments.is_empty()
    }

    #[must_use]
    pub fn add(&self, segment: &str) -> Self {
        let mut out = self.clone();
        out.segments.push(segment.to_string());
        out
    }

    /// Appends a relative path; an absolute path replaces this one outright.
    #[must_use]
    pub fn join(&self, other: &TypePath) -> Self {
        if other.is_absolute {
            return other.clone();
        }
        let mut out = self.clone();
        out.segments.extend(other.segments.iter().cloned());
        out
    }

    /// Splits off the last segment. Returns `None` for a path with no segments.
    pub fn split_last(&self) -> Option<(TypePath, &str)> {
        let (last, rest) = self.segments.split_last()?;
        let parent = TypePath {
            is_absolute: self.is_absolute,
            segments: rest.to_vec(),
        };
        Some((parent, last.as_str()))
    }

    pub fn parent(&self) -> Option<TypePath> {
        self.split_last().map(|(parent, _)| parent)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absolute {
            f.write_str("/")?;
        }
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPath(pub String);

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path {:?}: empty segment", self.0)
    }
}

impl std::error::Error for InvalidPath {}

impl FromStr for TypePath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (is_absolute, rest) = match s.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let mut path = TypePath {
            is_absolute,
            segments: Vec::new(),
        };
        if rest.is_empty() {
            return Ok(path);
        }
        for segment in rest.split('/') {
            if segment.is_empty() {
                return Err(InvalidPath(s.to_string()));
            }
            path.segments.push(segment.to_string());
        }
        Ok(path)
    }
}

/// The declaration a path introduces, named by its reserved segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    #[default]
    Plain,
    Var,
    Proc,
    Verb,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclKind::Plain => "plain",
            DeclKind::Var => "var",
            DeclKind::Proc => "proc",
            DeclKind::Verb => "verb",
        };
        f.write_str(s)
    }
}

/// A type path that may also declare something: `/mob/var/hp`,
/// `/mob/proc/attack`, `/mob/verb/say`.
///
/// `prefix` is the type the declaration is attached to. Once a reserved
/// segment has set `kind`, every later segment goes to `suffix`. For `var`
/// the suffix is the declared type followed by the variable name; for `proc`
/// and `verb` it is just the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DeclPath {
    pub kind: DeclKind,
    pub prefix: TypePath,
    pub suffix: TypePath,
}

impl DeclPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root() -> Self {
        Self {
            prefix: TypePath::root(),
            ..Self::default()
        }
    }

    pub fn plain(prefix: TypePath) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        self.kind == DeclKind::Plain
    }

    pub fn is_empty(&self) -> bool {
        self.is_plain() && self.prefix.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.prefix.is_absolute
    }

    /// Whether another plain segment may be appended.
    pub fn can_add(&self) -> bool {
        match self.kind {
            DeclKind::Plain | DeclKind::Var => true,
            DeclKind::Proc | DeclKind::Verb => self.suffix.segments.is_empty(),
        }
    }

    /// Whether a reserved segment may still set the kind.
    pub fn can_add_decl(&self) -> bool {
        self.is_plain()
    }

    /// Appends a plain segment. Callers check [`DeclPath::can_add`] first.
    #[must_use]
    pub fn add(&self, segment: &str) -> Self {
        let mut out = self.clone();
        if out.is_plain() {
            out.prefix.segments.push(segment.to_string());
        } else {
            out.suffix.segments.push(segment.to_string());
        }
        out
    }

    /// Sets the declaration kind. Callers check [`DeclPath::can_add_decl`] first.
    #[must_use]
    pub fn add_decl(&self, kind: DeclKind) -> Self {
        let mut out = self.clone();
        out.kind = kind;
        out
    }

    /// Returns the plain type path, or `None` if this path declares something.
    pub fn as_type_path(&self) -> Option<&TypePath> {
        self.is_plain().then_some(&self.prefix)
    }

    /// Resolves `relative` against this path, the way an indented line is
    /// resolved against the line that encloses it. Returns `None` when the
    /// combination is not a valid declaration path.
    pub fn join(&self, relative: &DeclPath) -> Option<DeclPath> {
        if relative.is_absolute() {
            return Some(relative.clone());
        }
        if self.is_plain() {
            return Some(DeclPath {
                kind: relative.kind,
                prefix: self.prefix.join(&relative.prefix),
                suffix: relative.suffix.clone(),
            });
        }
        if !relative.is_plain() {
            return None;
        }
        let mut out = self.clone();
        for segment in &relative.prefix.segments {
            if !out.can_add() {
                return None;
            }
            out = out.add(segment);
        }
        Some(out)
    }

    fn is_def(&self, kind: DeclKind) -> bool {
        self.kind == kind && !self.suffix.segments.is_empty()
    }

    pub fn is_var_def(&self) -> bool {
        self.is_def(DeclKind::Var)
    }

    pub fn is_proc_def(&self) -> bool {
        self.is_def(DeclKind::Proc)
    }

    pub fn is_verb_def(&self) -> bool {
        self.is_def(DeclKind::Verb)
    }

    /// Decomposes a complete declaration into the type it is attached to, the
    /// declared type of a variable (absolute, `None` for procs and verbs), and
    /// the declared name.
    pub fn split_def(&self) -> Option<(TypePath, Option<TypePath>, String)> {
        if self.is_plain() {
            return None;
        }
        let (declared, name) = self.suffix.split_last()?;
        let var_type = (self.kind == DeclKind::Var).then(|| TypePath::root().join(&declared));
        Some((self.prefix.clone(), var_type, name.to_string()))
    }
}

impl fmt::Display for DeclPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_plain() {
            return self.prefix.fmt(f);
        }
        write!(f, "{}", self.prefix)?;
        if !self.prefix.segments.is_empty() {
            f.write_str("/")?;
        }
        write!(f, "{}", self.kind)?;
        if !self.suffix.segments.is_empty() {
            write!(f, "/{}", self.suffix.segments.join("/"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> TypePath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(path("/obj/item"), TypePath::absolute(["obj", "item"]));
        assert_eq!(path("obj/item/"), TypePath::relative(["obj", "item"]));
        assert_eq!(path("/"), TypePath::root());
        assert_eq!(path(""), TypePath::empty());
        assert!("/obj//item".parse::<TypePath>().is_err());
        assert_eq!(path("/mob/player").to_string(), "/mob/player");
        assert_eq!(path("mob/player").to_string(), "mob/player");
    }

    #[test]
    fn test_join() {
        assert_eq!(path("/obj").join(&path("item")), path("/obj/item"));
        assert_eq!(path("/obj").join(&path("/mob")), path("/mob"));
        assert_eq!(path("/obj").add("item"), path("/obj/item"));
    }

    #[test]
    fn test_split_last() {
        let p = path("/obj/item");
        let (parent, last) = p.split_last().unwrap();
        assert_eq!(parent, path("/obj"));
        assert_eq!(last, "item");
        assert!(TypePath::root().split_last().is_none());
    }

    #[test]
    fn test_decl_path_queries() {
        let var = DeclPath::root()
            .add("mob")
            .add_decl(DeclKind::Var)
            .add("obj")
            .add("weapon");
        assert!(var.is_var_def());
        assert!(!var.is_proc_def());
        assert_eq!(var.to_string(), "/mob/var/obj/weapon");
        let (anchor, var_type, name) = var.split_def().unwrap();
        assert_eq!(anchor, path("/mob"));
        assert_eq!(var_type, Some(path("/obj")));
        assert_eq!(name, "weapon");

        let incomplete = DeclPath::root().add("mob").add_decl(DeclKind::Proc);
        assert!(!incomplete.is_proc_def());
        assert!(incomplete.can_add());
        let proc = incomplete.add("attack");
        assert!(proc.is_proc_def());
        assert!(!proc.can_add());
        assert!(!proc.can_add_decl());
        let (anchor, var_type, name) = proc.split_def().unwrap();
        assert_eq!(anchor, path("/mob"));
        assert_eq!(var_type, None);
        assert_eq!(name, "attack");
    }

    #[test]
    fn test_nested_join_matches_direct_path() {
        let direct = DeclPath::root().add("obj").add_decl(DeclKind::Var).add("x");
        let obj = DeclPath::root().join(&DeclPath::plain(path("/obj"))).unwrap();
        let var = obj.join(&DeclPath::empty().add_decl(DeclKind::Var)).unwrap();
        let x = var.join(&DeclPath::plain(path("x"))).unwrap();
        assert_eq!(x, direct);
    }

    #[test]
    fn test_join_rejections() {
        let proc = DeclPath::root().add("mob").add_decl(DeclKind::Proc);
        // a second reserved segment
        assert!(proc.join(&DeclPath::empty().add_decl(DeclKind::Var)).is_none());
        // too many names for a proc
        assert!(proc.join(&DeclPath::plain(path("a/b"))).is_none());
        assert!(proc.join(&DeclPath::plain(path("a"))).is_some());
        // absolute wins outright
        let abs = DeclPath::plain(path("/turf"));
        assert_eq!(proc.join(&abs), Some(abs));
    }
}
