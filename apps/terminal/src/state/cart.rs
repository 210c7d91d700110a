//! # Cart State
//!
//! Holds the single active cart of this terminal.
//!
//! ## Locking
//! The cart sits behind `Arc<Mutex<Cart>>`: one cashier, one cart, and every
//! engine operation runs to completion under the lock. Network calls never
//! happen while the lock is held; the session takes what it needs, releases,
//! awaits, then locks again to apply the result.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  with_cart_mut(begin_submission) ──► order         (lock released)     │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │              create_sale(order).await              (no lock held)      │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  with_cart_mut(complete_submission | abort_submission)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use rxpos_core::Cart;

/// Shared handle to the active cart. Clones point at the same cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Runs `f` with read access to the cart.
    ///
    /// ## Usage
    /// ```rust
    /// use rxpos_terminal::state::CartState;
    ///
    /// let state = CartState::new();
    /// assert!(state.with_cart(|cart| cart.is_empty()));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        // A panic mid-operation cannot leave the cart half-applied: engine
        // operations validate before they write.
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Runs `f` with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    /// A copy of the cart as it is now.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }
}
