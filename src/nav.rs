//! Navigation Shell
//!
//! Declarative route table. Each route maps a path to one resource; the
//! sidebar lists routes in table order and number keys select them.

use crate::resource::ResourceKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Cajeros,
    Pagos,
    Recibos,
    Extornos,
    Contribuyentes,
    Conceptos,
}

impl Route {
    /// Sidebar order
    pub const ALL: [Route; 6] = [
        Route::Cajeros,
        Route::Pagos,
        Route::Recibos,
        Route::Extornos,
        Route::Contribuyentes,
        Route::Conceptos,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Cajeros => "/cajeros",
            Route::Pagos => "/pagos",
            Route::Recibos => "/recibos",
            Route::Extornos => "/extornos",
            Route::Contribuyentes => "/contribuyentes",
            Route::Conceptos => "/conceptos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Cajeros => "Cajeros",
            Route::Pagos => "Pagos",
            Route::Recibos => "Recibos",
            Route::Extornos => "Extornos",
            Route::Contribuyentes => "Contribuyentes",
            Route::Conceptos => "Concepto Pago",
        }
    }

    pub fn resource(self) -> ResourceKind {
        match self {
            Route::Cajeros => ResourceKind::Cajeros,
            Route::Pagos => ResourceKind::Pagos,
            Route::Recibos => ResourceKind::Recibos,
            Route::Extornos => ResourceKind::Extornos,
            Route::Contribuyentes => ResourceKind::Contribuyentes,
            Route::Conceptos => ResourceKind::ConceptosPago,
        }
    }

    pub fn for_resource(kind: ResourceKind) -> Self {
        Self::ALL
            .into_iter()
            .find(|r| r.resource() == kind)
            .unwrap_or(Route::Cajeros)
    }

    /// Zero-based sidebar position
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    /// Route at a 1-based sidebar shortcut
    pub fn from_shortcut(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Accepts `/pagos`, `pagos` or a resource key such as `conceptos-pago`
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let name = input.strip_prefix('/').unwrap_or(input);
        if name.is_empty() {
            return None;
        }

        Self::ALL
            .into_iter()
            .find(|r| &r.path()[1..] == name)
            .or_else(|| ResourceKind::from_key(name).map(Self::for_resource))
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Non-route commands accepted in command mode
pub const COMMANDS: [&str; 4] = ["q", "quit", "refresh", "help"];

/// Every command-mode completion: route names, resource keys, then commands
pub fn command_names() -> Vec<String> {
    let mut names: Vec<String> = Route::ALL
        .iter()
        .map(|r| r.path()[1..].to_string())
        .collect();

    for kind in ResourceKind::ALL {
        let key = kind.key().to_string();
        if !names.contains(&key) {
            names.push(key);
        }
    }

    names.extend(COMMANDS.iter().map(|c| c.to_string()));
    names
}
