//! Sample targets and wrapper interfaces shared by tests and benches.

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

use crate::executable::{Executable, TypeDescriptor};
use crate::shape::{InterfaceDecl, ShapeDecl, WrapperInterface};
use crate::value::TypeToken;

/// Mutable sample type; receivers are shared, so state uses interior
/// mutability.
#[derive(Debug, Default)]
pub struct Account {
    pub owner: Mutex<String>,
    pub balance: AtomicI64,
}

impl Account {
    #[must_use]
    pub fn new(owner: &str, balance: i64) -> Self {
        Self {
            owner: Mutex::new(owner.to_string()),
            balance: AtomicI64::new(balance),
        }
    }

    #[must_use]
    pub fn owner(&self) -> String {
        self.owner.lock().clone()
    }

    pub fn rename(&self, owner: String) {
        *self.owner.lock() = owner;
    }

    #[must_use]
    pub fn balance(&self) -> i64 {
        self.balance.load(Ordering::SeqCst)
    }

    pub fn deposit(&self, amount: i64, times: i64) {
        self.balance.fetch_add(amount * times, Ordering::SeqCst);
    }

    #[must_use]
    pub fn projected(&self, rate: i64, years: i64, bonus: i64) -> i64 {
        self.balance() * (100 + rate * years) / 100 + bonus
    }

    #[must_use]
    pub fn length_of(&self, text: String) -> i32 {
        i32::try_from(text.len()).unwrap_or(i32::MAX)
    }
}

/// Wrapper interface with a single exactly typed shape
/// `measure(caller, String) -> i32`.
#[derive(Debug)]
pub struct Measure;

impl WrapperInterface for Measure {
    fn declare() -> InterfaceDecl {
        InterfaceDecl::new::<Self>()
            .shape(ShapeDecl::exact("measure").caller().param::<String>().returns::<i32>())
    }
}

/// Wrapper interface with one untyped two-argument function shape.
#[derive(Debug)]
pub struct Pipe;

impl WrapperInterface for Pipe {
    fn declare() -> InterfaceDecl {
        InterfaceDecl::new::<Self>().shape(
            ShapeDecl::generic("pipe")
                .caller()
                .erased_params(1)
                .returns_value(),
        )
    }
}

/// Descriptor of [`Account`] with its constructors and methods.
#[must_use]
pub fn account_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<Account>()
        .with(Executable::constructor(Account::default))
        .with(Executable::constructor(|owner: String, balance: i64| {
            Account::new(&owner, balance)
        }))
        .with(Executable::method("owner", Account::owner))
        .with(Executable::method("rename", Account::rename))
        .with(Executable::method("balance", Account::balance))
        .with(Executable::method("deposit", Account::deposit))
        .with(Executable::method("projected", Account::projected))
        .with(Executable::method("length_of", Account::length_of))
        .with(Executable::method("audit", |a: &Account| a.balance() >= 0).private())
        .with(Executable::function(
            TypeToken::of::<Account>(),
            "currency",
            || String::from("EUR"),
        ))
}
