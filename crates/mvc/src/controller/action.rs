use crate::controller::{ActionResult, Controller};
use crate::route::MethodSpec;
use http::Method;
use std::borrow::Cow;
use std::fmt;

/// The controller method a request ends up in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Get,
    Post,
    Head,
    Delete,
    Put,
    Patch,
    Options,
    Named(String),
}

impl Action {
    /// The canonical action of an HTTP verb, `None` for verbs without one.
    pub fn for_method(method: &Method) -> Option<Self> {
        match method {
            &Method::GET => Some(Self::Get),
            &Method::POST => Some(Self::Post),
            &Method::HEAD => Some(Self::Head),
            &Method::DELETE => Some(Self::Delete),
            &Method::PUT => Some(Self::Put),
            &Method::PATCH => Some(Self::Patch),
            &Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }

    /// Resolves an explicit method name; the canonical verb names map to
    /// their verb actions.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Get" => Self::Get,
            "Post" => Self::Post,
            "Head" => Self::Head,
            "Delete" => Self::Delete,
            "Put" => Self::Put,
            "Patch" => Self::Patch,
            "Options" => Self::Options,
            other => Self::Named(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Head => "Head",
            Self::Delete => "Delete",
            Self::Put => "Put",
            Self::Patch => "Patch",
            Self::Options => "Options",
            Self::Named(name) => name,
        }
    }

    pub(crate) async fn invoke(&self, controller: &mut dyn Controller) -> ActionResult {
        match self {
            Self::Get => controller.get().await,
            Self::Post => controller.post().await,
            Self::Head => controller.head().await,
            Self::Delete => controller.delete().await,
            Self::Put => controller.put().await,
            Self::Patch => controller.patch().await,
            Self::Options => controller.options().await,
            Self::Named(name) => controller.action(name).await,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a controller route picks its action, decided once when the route is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPlan {
    /// An explicit method name, or the canonical action of the route's verb.
    Fixed(Action),
    /// A wildcard route maps the verb of each request.
    ByRequestMethod,
    /// The route's verb has no canonical action and no name was declared.
    Skip,
}

impl ActionPlan {
    pub fn resolve(method: &MethodSpec, method_name: Option<&str>) -> Self {
        if let Some(name) = method_name.filter(|name| !name.is_empty()) {
            return Self::Fixed(Action::from_name(name));
        }

        match method {
            MethodSpec::Any => Self::ByRequestMethod,
            MethodSpec::Exact(method) => Action::for_method(method).map_or(Self::Skip, Self::Fixed),
        }
    }

    /// The action to run for a request with `method`, `None` to skip the action step.
    pub fn action_for(&self, method: &Method) -> Option<Cow<'_, Action>> {
        match self {
            Self::Fixed(action) => Some(Cow::Borrowed(action)),
            Self::ByRequestMethod => Action::for_method(method).map(Cow::Owned),
            Self::Skip => None,
        }
    }
}
