//! # Cashier Session
//!
//! One cashier, one terminal, one active cart. [`PosSession`] is the single
//! entry point for everything the console (or any other front end) does.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  search_stock ──► StockLookup (debounced, branch-scoped) ──► options   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  add_option(n) ──► Cart::add_or_increment                               │
//! │  set_quantity / set_discount / remove_line ──► Cart                     │
//! │                                                                         │
//! │  search_customers ──► pick_customer(n) | walk_in                        │
//! │  identify_face ──► FaceIdentifier ──► Cart::apply_face_match            │
//! │                      (any failure counts as no match)                   │
//! │                                                                         │
//! │  complete_sale ──► begin_submission ──► SaleGateway::create_sale        │
//! │                          │                    │                         │
//! │                          │          ok ───────┴─────── err              │
//! │                          │           ▼                  ▼               │
//! │                          │   complete_submission   abort_submission     │
//! │                          │      (Frozen)            (Building, intact)  │
//! │                          ▼                                              │
//! │  print_invoice ──► InvoicePrinter ──► acknowledge_printed ──► new cart │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Operations take `&self`. The cart lock is only held for the engine call
//! itself, never across a network await, so a face lookup in flight does not
//! block cart edits. The `Submitting` phase is what prevents a second
//! submission while the first is outstanding.

use chrono::{NaiveDate, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use rxpos_client::{
    BackendClient, CustomerDirectory, CustomerLookup, Debounced, FaceIdentifier, SaleGateway,
    StockCatalog, StockLookup,
};
use rxpos_core::history::{HistoryQuery, SaleSummary};
use rxpos_core::invoice::Invoice;
use rxpos_core::submission::CompletedSale;
use rxpos_core::types::{Branch, Customer, EntityId, FaceMatch, PaymentMethod, Percentage, StockRow};
use rxpos_core::validation::validate_search_query;
use rxpos_core::{Cart, CartLine, Grants};

use crate::error::PosError;
use crate::printer::InvoicePrinter;
use crate::state::{CartState, TerminalConfig};

// =============================================================================
// Adapters
// =============================================================================

/// The backend collaborators a session talks to.
#[derive(Clone)]
pub struct Adapters {
    pub catalog: Arc<dyn StockCatalog>,
    pub directory: Arc<dyn CustomerDirectory>,
    pub faces: Arc<dyn FaceIdentifier>,
    pub sales: Arc<dyn SaleGateway>,
}

impl Adapters {
    /// All four adapters served by one HTTP client.
    pub fn from_client(client: BackendClient) -> Self {
        let client = Arc::new(client);
        Adapters {
            catalog: client.clone(),
            directory: client.clone(),
            faces: client.clone(),
            sales: client,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct PosSession {
    cart: CartState,
    config: TerminalConfig,
    grants: Grants,
    default_gst: Percentage,
    adapters: Adapters,
    stock_lookup: StockLookup,
    customer_lookup: CustomerLookup,
    branch: Mutex<Option<Branch>>,
    stock_options: Mutex<Vec<StockRow>>,
    customer_options: Mutex<Vec<Customer>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PosSession {
    pub fn new(config: TerminalConfig, adapters: Adapters) -> Self {
        let quiet = config.lookup.debounce();
        PosSession {
            cart: CartState::new(),
            grants: config.operator.grants.clone(),
            default_gst: config.store.default_gst(),
            stock_lookup: StockLookup::new(adapters.catalog.clone(), quiet),
            customer_lookup: CustomerLookup::new(adapters.directory.clone(), quiet),
            branch: Mutex::new(config.store.branch()),
            stock_options: Mutex::new(Vec::new()),
            customer_options: Mutex::new(Vec::new()),
            adapters,
            config,
        }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// A copy of the active cart.
    pub fn cart(&self) -> Cart {
        self.cart.snapshot()
    }

    pub fn branch(&self) -> Option<Branch> {
        lock(&self.branch).clone()
    }

    pub fn stock_options(&self) -> Vec<StockRow> {
        lock(&self.stock_options).clone()
    }

    pub fn customer_options(&self) -> Vec<Customer> {
        lock(&self.customer_options).clone()
    }

    /// Changes the branch used by lookups and submission.
    ///
    /// Pending lookups are dropped along with the options of the old branch.
    /// The cart is left as it is.
    pub fn switch_branch(&self, branch: Branch) {
        info!(branch_id = %branch.id, branch = %branch.display_name(), "Switching branch");
        self.stock_lookup.supersede();
        self.customer_lookup.supersede();
        lock(&self.stock_options).clear();
        *lock(&self.branch) = Some(branch);
    }

    fn require_branch(&self, doing: &str) -> Result<Branch, PosError> {
        self.branch()
            .ok_or_else(|| PosError::validation(format!("Select a branch before {}", doing)))
    }

    // -------------------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------------------

    /// Searches the current branch's stock.
    ///
    /// Returns `None` when a newer search overtook this one. A failed lookup
    /// clears the options and reports `LOOKUP_FAILED`; the cart is untouched.
    pub async fn search_stock(&self, query: &str) -> Result<Option<Vec<StockRow>>, PosError> {
        let query = validate_search_query(query)?;
        let branch = self.require_branch("searching stock")?;
        debug!(branch_id = %branch.id, %query, "search_stock");

        match self.stock_lookup.search(&branch, &query).await {
            Debounced::Superseded => Ok(None),
            Debounced::Ready(Ok(rows)) => {
                *lock(&self.stock_options) = rows.clone();
                Ok(Some(rows))
            }
            Debounced::Ready(Err(e)) => {
                lock(&self.stock_options).clear();
                Err(PosError::lookup_failed(e))
            }
        }
    }

    /// Adds the `index`-th (0-based) option of the last stock search.
    ///
    /// The options stay listed after a successful add, so adding the same
    /// option again is how the console increments a line.
    pub fn add_option(&self, index: usize) -> Result<CartLine, PosError> {
        let row = self
            .stock_options()
            .get(index)
            .cloned()
            .ok_or_else(|| PosError::not_found(format!("No stock option {}", index + 1)))?;
        self.add_stock(&row)
    }

    pub fn add_stock(&self, row: &StockRow) -> Result<CartLine, PosError> {
        let line = self
            .cart
            .with_cart_mut(|cart| cart.add_or_increment(row, self.default_gst).cloned())?;
        info!(
            stock_id = %line.stock_id,
            quantity = line.quantity,
            available = line.quantity_available,
            "Stock added to cart"
        );
        Ok(line)
    }

    pub fn set_quantity(&self, stock_id: &EntityId, quantity: i64) -> Result<(), PosError> {
        self.cart
            .with_cart_mut(|cart| cart.set_quantity(stock_id, quantity))?;
        info!(%stock_id, quantity, "Line quantity set");
        Ok(())
    }

    /// Sets a line discount with the operator's grants. Returns the stored
    /// (clamped) value.
    pub fn set_discount(&self, stock_id: &EntityId, raw_percent: f64) -> Result<Percentage, PosError> {
        let result = self
            .cart
            .with_cart_mut(|cart| cart.set_discount(stock_id, raw_percent, &self.grants));
        match result {
            Ok(discount) => {
                info!(%stock_id, discount = %discount, "Line discount set");
                Ok(discount)
            }
            Err(e) => {
                warn!(%stock_id, operator = ?self.config.operator.name, error = %e, "Discount rejected");
                Err(e.into())
            }
        }
    }

    pub fn remove_line(&self, stock_id: &EntityId) -> Result<(), PosError> {
        self.cart.with_cart_mut(|cart| cart.remove_line(stock_id))?;
        info!(%stock_id, "Line removed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer
    // -------------------------------------------------------------------------

    pub async fn search_customers(&self, query: &str) -> Result<Option<Vec<Customer>>, PosError> {
        let query = validate_search_query(query)?;
        debug!(%query, "search_customers");

        match self.customer_lookup.search(&query).await {
            Debounced::Superseded => Ok(None),
            Debounced::Ready(Ok(customers)) => {
                *lock(&self.customer_options) = customers.clone();
                Ok(Some(customers))
            }
            Debounced::Ready(Err(e)) => {
                lock(&self.customer_options).clear();
                Err(PosError::lookup_failed(e))
            }
        }
    }

    /// Selects the `index`-th (0-based) option of the last customer search.
    pub fn pick_customer(&self, index: usize) -> Result<Customer, PosError> {
        let customer = self
            .customer_options()
            .get(index)
            .cloned()
            .ok_or_else(|| PosError::not_found(format!("No customer option {}", index + 1)))?;
        self.cart
            .with_cart_mut(|cart| cart.select_customer(Some(customer.clone())))?;
        info!(customer_id = %customer.id, "Customer selected");
        Ok(customer)
    }

    pub fn walk_in(&self) -> Result<(), PosError> {
        self.cart.with_cart_mut(|cart| cart.select_customer(None))?;
        info!("Walk-in sale");
        Ok(())
    }

    /// Identifies the customer from a captured still.
    ///
    /// Any adapter failure is treated as no match so the cashier can carry
    /// on with manual search. Only a locked cart is reported as an error.
    pub async fn identify_face(&self, image: &[u8]) -> Result<FaceMatch, PosError> {
        let branch = self.require_branch("identifying a customer")?;

        let outcome = match self.adapters.faces.identify_face(image, &branch).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Face identification unavailable, treating as no match");
                FaceMatch::NoMatch
            }
        };

        self.cart
            .with_cart_mut(|cart| cart.apply_face_match(outcome.clone()))?;
        match &outcome {
            FaceMatch::Matched {
                customer,
                recognition_log_id,
            } => info!(customer_id = %customer.id, ?recognition_log_id, "Face matched"),
            FaceMatch::NoMatch => info!("No face match"),
        }
        Ok(outcome)
    }

    pub fn set_payment(&self, method: PaymentMethod) -> Result<(), PosError> {
        self.cart
            .with_cart_mut(|cart| cart.set_payment_method(method))?;
        info!(payment_method = %method, "Payment method set");
        Ok(())
    }

    /// Past sales of the selected customer over the configured window,
    /// ending `today`.
    pub async fn customer_history(&self, today: NaiveDate) -> Result<Vec<SaleSummary>, PosError> {
        let customer = self
            .cart
            .with_cart(|cart| cart.customer().cloned())
            .ok_or_else(|| PosError::validation("Select a customer to see purchase history"))?;

        let query = HistoryQuery::last_months(
            &customer,
            self.branch().as_ref(),
            today,
            self.config.lookup.history_months,
        );
        debug!(customer_id = %customer.id, from = %query.from_date, to = %query.to_date, "customer_history");

        self.adapters
            .directory
            .purchase_history(&query)
            .await
            .map_err(PosError::lookup_failed)
    }

    // -------------------------------------------------------------------------
    // Sale
    // -------------------------------------------------------------------------

    /// Submits the cart and freezes it on success.
    ///
    /// On failure the cart returns to `Building` unchanged and the error is
    /// reported; nothing is retried.
    pub async fn complete_sale(&self) -> Result<Invoice, PosError> {
        let branch = self.branch();
        let order = self
            .cart
            .with_cart_mut(|cart| cart.begin_submission(branch.as_ref()))?;

        info!(
            branch_id = %order.branch_id,
            items = order.items.len(),
            final_amount = %order.final_amount,
            "Submitting sale"
        );

        match self.adapters.sales.create_sale(&order).await {
            Ok(receipt) => {
                let now = Utc::now();
                self.cart
                    .with_cart_mut(|cart| cart.complete_submission(receipt, now).map(|_| ()))?;
                let invoice = self.cart.with_cart(Invoice::from_cart)?;
                info!(invoice = %invoice.reference(), "Sale recorded");
                Ok(invoice)
            }
            Err(e) => {
                if let Err(abort) = self.cart.with_cart_mut(|cart| cart.abort_submission()) {
                    warn!(error = %abort, "Cart was not submitting when the sale failed");
                }
                Err(PosError::submission_failed(e))
            }
        }
    }

    /// The invoice of the frozen sale.
    pub fn invoice(&self) -> Result<Invoice, PosError> {
        Ok(self.cart.with_cart(Invoice::from_cart)?)
    }

    /// Prints the frozen sale's invoice, then acknowledges it.
    ///
    /// If the printer refuses, the cart stays frozen so printing can be
    /// retried.
    pub async fn print_invoice(&self, printer: &dyn InvoicePrinter) -> Result<CompletedSale, PosError> {
        let invoice = self.invoice()?;
        let text = invoice.render_text(self.config.receipt.width, &self.config.receipt.currency_symbol);
        printer.print(&invoice, &text).await?;
        self.acknowledge_printed()
    }

    /// Clears the frozen sale and opens a fresh cart.
    pub fn acknowledge_printed(&self) -> Result<CompletedSale, PosError> {
        let sale = self.cart.with_cart_mut(|cart| cart.acknowledge_printed())?;
        lock(&self.stock_options).clear();
        lock(&self.customer_options).clear();
        info!(invoice = ?sale.invoice_number, "Invoice acknowledged, cart reset");
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use rxpos_client::{ClientError, ClientResult};
    use rxpos_core::submission::{SaleOrder, SaleReceipt};
    use rxpos_core::CartPhase;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // =========================================================================
    // Fakes
    // =========================================================================

    #[derive(Default)]
    struct FakeBackend {
        rows: Vec<StockRow>,
        customers: Vec<Customer>,
        face: Option<FaceMatch>,
        face_down: bool,
        sale_error: Option<ClientError>,
        sales: Mutex<Vec<SaleOrder>>,
        history_queries: Mutex<Vec<HistoryQuery>>,
        face_calls: AtomicUsize,
    }

    #[async_trait]
    impl StockCatalog for FakeBackend {
        async fn search_stock(&self, _branch: &Branch, _query: &str) -> ClientResult<Vec<StockRow>> {
            Ok(self.rows.clone())
        }
    }

    #[async_trait]
    impl CustomerDirectory for FakeBackend {
        async fn search_customers(&self, _query: &str) -> ClientResult<Vec<Customer>> {
            Ok(self.customers.clone())
        }

        async fn purchase_history(&self, query: &HistoryQuery) -> ClientResult<Vec<SaleSummary>> {
            self.history_queries.lock().unwrap().push(query.clone());
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl FaceIdentifier for FakeBackend {
        async fn identify_face(&self, _image: &[u8], _branch: &Branch) -> ClientResult<FaceMatch> {
            self.face_calls.fetch_add(1, Ordering::SeqCst);
            if self.face_down {
                return Err(ClientError::Timeout(15));
            }
            Ok(self.face.clone().unwrap_or(FaceMatch::NoMatch))
        }
    }

    #[async_trait]
    impl SaleGateway for FakeBackend {
        async fn create_sale(&self, order: &SaleOrder) -> ClientResult<SaleReceipt> {
            self.sales.lock().unwrap().push(order.clone());
            match &self.sale_error {
                Some(e) => Err(e.clone()),
                None => Ok(SaleReceipt {
                    invoice_number: Some("INV-0001".into()),
                    id: Some(EntityId::Int(55)),
                }),
            }
        }
    }

    fn batch_a() -> StockRow {
        StockRow {
            stock_id: Some(EntityId::Int(101)),
            product_id: Some(EntityId::Int(11)),
            product_name: Some("Amoxicillin 500mg".into()),
            batch_number: Some("A-1".into()),
            expiry_date: Some("2027-03-31".into()),
            mrp: Some(120.0),
            selling_price: Some(100.0),
            gst_percentage: Some(12.0),
            quantity_available: Some(5.0),
            ..StockRow::default()
        }
    }

    fn customer() -> Customer {
        Customer {
            id: EntityId::Int(7),
            first_name: Some("Ravi".into()),
            last_name: Some("Kumar".into()),
            phone: Some("9845000000".into()),
        }
    }

    fn config(grants: Grants) -> TerminalConfig {
        let mut config = TerminalConfig::default();
        config.store.branch_id = Some(EntityId::Int(3));
        config.store.branch_name = Some("MG Road".into());
        config.lookup.debounce_ms = 10;
        config.operator.grants = grants;
        config
    }

    fn session_with(backend: FakeBackend, grants: Grants) -> (PosSession, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let adapters = Adapters {
            catalog: backend.clone(),
            directory: backend.clone(),
            faces: backend.clone(),
            sales: backend.clone(),
        };
        (PosSession::new(config(grants), adapters), backend)
    }

    fn stocked() -> FakeBackend {
        FakeBackend {
            rows: vec![batch_a()],
            customers: vec![customer()],
            ..FakeBackend::default()
        }
    }

    struct RecordingPrinter {
        printed: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl InvoicePrinter for RecordingPrinter {
        async fn print(&self, _invoice: &Invoice, text: &str) -> Result<(), PosError> {
            if self.fail {
                return Err(PosError::print_failed("paper out"));
            }
            self.printed.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_reference_sale() {
        let (session, backend) = session_with(stocked(), Grants::elevated());
        let stock_id = EntityId::Int(101);

        let options = session.search_stock("amox").await.unwrap().unwrap();
        assert_eq!(options.len(), 1);

        session.add_option(0).unwrap();
        let line = session.add_option(0).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_total().minor(), 20_000);

        session.set_discount(&stock_id, 10.0).unwrap();
        assert_eq!(session.cart().totals().total_amount.minor(), 18_000);

        let err = session.set_quantity(&stock_id, 6).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(session.cart().line(&stock_id).unwrap().quantity, 2);

        let invoice = session.complete_sale().await.unwrap();
        assert_eq!(invoice.reference(), "INV-0001");
        assert_eq!(session.cart().phase(), CartPhase::Frozen);

        let sent = backend.sales.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].total_amount.minor(), 18_000);
        assert_eq!(sent[0].final_amount.minor(), 18_000);
        assert_eq!(sent[0].branch_id, EntityId::Int(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discount_without_permission() {
        let (session, _) = session_with(stocked(), Grants::none());
        session.add_stock(&batch_a()).unwrap();

        let err = session.set_discount(&EntityId::Int(101), 25.0).unwrap_err();

        assert_eq!(err.code, ErrorCode::NotAuthorized);
        assert!(session.cart().lines()[0].discount.is_zero());
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_backend() {
        let (session, backend) = session_with(stocked(), Grants::none());

        let err = session.complete_sale().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidSubmission);
        assert!(backend.sales.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_total_never_reaches_backend() {
        let (session, backend) = session_with(stocked(), Grants::elevated());
        session.add_stock(&batch_a()).unwrap();
        session.set_discount(&EntityId::Int(101), 100.0).unwrap();

        let err = session.complete_sale().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidSubmission);
        assert!(backend.sales.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_cart() {
        let backend = FakeBackend {
            sale_error: Some(ClientError::Request("connection reset".into())),
            ..stocked()
        };
        let (session, _) = session_with(backend, Grants::none());
        session.add_stock(&batch_a()).unwrap();
        let before = session.cart();

        let err = session.complete_sale().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::SubmissionFailed);
        assert_eq!(session.cart(), before);
        assert_eq!(session.cart().phase(), CartPhase::Building);
        // the operator can carry on editing and retry
        session.set_quantity(&EntityId::Int(101), 2).unwrap();
    }

    #[tokio::test]
    async fn test_frozen_cart_rejects_edits() {
        let (session, _) = session_with(stocked(), Grants::elevated());
        session.add_stock(&batch_a()).unwrap();
        session.complete_sale().await.unwrap();

        let id = EntityId::Int(101);
        assert_eq!(session.add_stock(&batch_a()).unwrap_err().code, ErrorCode::CartLocked);
        assert_eq!(session.set_quantity(&id, 1).unwrap_err().code, ErrorCode::CartLocked);
        assert_eq!(session.set_discount(&id, 5.0).unwrap_err().code, ErrorCode::CartLocked);
        assert_eq!(session.complete_sale().await.unwrap_err().code, ErrorCode::CartLocked);
        assert_eq!(session.cart().lines()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_print_then_reset() {
        let (session, _) = session_with(stocked(), Grants::none());
        session.add_stock(&batch_a()).unwrap();
        session.set_payment(PaymentMethod::Upi).unwrap();
        session.complete_sale().await.unwrap();

        let printer = RecordingPrinter {
            printed: Mutex::new(Vec::new()),
            fail: false,
        };
        let sale = session.print_invoice(&printer).await.unwrap();

        assert_eq!(sale.invoice_number.as_deref(), Some("INV-0001"));
        assert!(printer.printed.lock().unwrap()[0].contains("INV-0001"));
        assert_eq!(session.cart(), Cart::new());
    }

    #[tokio::test]
    async fn test_printer_failure_keeps_sale_frozen() {
        let (session, _) = session_with(stocked(), Grants::none());
        session.add_stock(&batch_a()).unwrap();
        session.complete_sale().await.unwrap();

        let printer = RecordingPrinter {
            printed: Mutex::new(Vec::new()),
            fail: true,
        };
        let err = session.print_invoice(&printer).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::PrintFailed);
        assert_eq!(session.cart().phase(), CartPhase::Frozen);
    }

    #[tokio::test]
    async fn test_print_without_sale() {
        let (session, _) = session_with(stocked(), Grants::none());
        let printer = RecordingPrinter {
            printed: Mutex::new(Vec::new()),
            fail: false,
        };
        let err = session.print_invoice(&printer).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    // =========================================================================
    // Customers and face
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_pick_customer_from_search() {
        let (session, _) = session_with(stocked(), Grants::none());

        let found = session.search_customers("ravi").await.unwrap().unwrap();
        assert_eq!(found.len(), 1);

        session.pick_customer(0).unwrap();
        assert_eq!(session.cart().customer(), Some(&customer()));

        session.walk_in().unwrap();
        assert!(session.cart().customer().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pick_out_of_range() {
        let (session, _) = session_with(stocked(), Grants::none());
        session.search_customers("ravi").await.unwrap();
        assert_eq!(session.pick_customer(3).unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_face_match_sets_customer() {
        let backend = FakeBackend {
            face: Some(FaceMatch::Matched {
                customer: customer(),
                recognition_log_id: Some("rec-9".into()),
            }),
            ..stocked()
        };
        let (session, _) = session_with(backend, Grants::none());
        session.add_stock(&batch_a()).unwrap();

        let outcome = session.identify_face(b"jpeg").await.unwrap();

        assert!(outcome.is_match());
        let cart = session.cart();
        assert_eq!(cart.customer(), Some(&customer()));
        assert_eq!(cart.recognition_log_id(), Some("rec-9"));
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_face_no_match_keeps_customer() {
        let (session, _) = session_with(stocked(), Grants::none());
        session.add_stock(&batch_a()).unwrap();
        let before = session.cart();

        let outcome = session.identify_face(b"jpeg").await.unwrap();

        assert_eq!(outcome, FaceMatch::NoMatch);
        assert_eq!(session.cart(), before);
    }

    #[tokio::test]
    async fn test_face_outage_degrades_to_no_match() {
        let backend = FakeBackend {
            face_down: true,
            ..stocked()
        };
        let (session, backend) = session_with(backend, Grants::none());
        session.add_stock(&batch_a()).unwrap();

        let outcome = session.identify_face(b"jpeg").await.unwrap();

        assert_eq!(outcome, FaceMatch::NoMatch);
        assert_eq!(backend.face_calls.load(Ordering::SeqCst), 1);
        // the sale can still go through
        session.complete_sale().await.unwrap();
    }

    #[tokio::test]
    async fn test_history_requires_customer() {
        let (session, _) = session_with(stocked(), Grants::none());
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let err = session.customer_history(today).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_window() {
        let (session, backend) = session_with(stocked(), Grants::none());
        session.search_customers("ravi").await.unwrap();
        session.pick_customer(0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        session.customer_history(today).await.unwrap();

        let queries = backend.history_queries.lock().unwrap();
        assert_eq!(queries[0].customer_id, EntityId::Int(7));
        assert_eq!(queries[0].branch_id, Some(EntityId::Int(3)));
        assert_eq!(queries[0].from_date, NaiveDate::from_ymd_opt(2026, 4, 16).unwrap());
        assert_eq!(queries[0].to_date, today);
    }

    // =========================================================================
    // Branch
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_switch_branch_keeps_cart() {
        let (session, _) = session_with(stocked(), Grants::none());
        session.search_stock("amox").await.unwrap();
        session.add_option(0).unwrap();

        session.switch_branch(Branch::new(8));

        assert_eq!(session.branch().unwrap().id, EntityId::Int(8));
        assert!(session.stock_options().is_empty());
        assert_eq!(session.cart().lines().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_branch_drops_pending_search() {
        let (session, _) = session_with(stocked(), Grants::none());
        let session = Arc::new(session);

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.search_stock("amox").await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        session.switch_branch(Branch::new(8));

        assert_eq!(pending.await.unwrap().unwrap(), None);
        assert!(session.stock_options().is_empty());
    }

    #[tokio::test]
    async fn test_search_without_branch() {
        let backend = Arc::new(stocked());
        let adapters = Adapters {
            catalog: backend.clone(),
            directory: backend.clone(),
            faces: backend.clone(),
            sales: backend.clone(),
        };
        let session = PosSession::new(TerminalConfig::default(), adapters);

        let err = session.search_stock("amox").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
