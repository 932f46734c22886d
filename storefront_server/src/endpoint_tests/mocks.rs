use chrono::{Duration, TimeZone, Utc};
use mockall::mock;
use storefront_engine::{
    db_types::{
        Amount,
        CartLine,
        CartPurgeResult,
        NewPayment,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentProvider,
        PaymentStatus,
        Product,
        ProductId,
        StockDecrement,
        UserId,
    },
    payment_objects::PaymentEvent,
    traits::{
        CartManagement,
        CheckoutResult,
        FulfillmentError,
        InventoryManagement,
        OrderManagement,
        OrderTransition,
        PaymentManagement,
        ReconcileOutcome,
    },
};

mock! {
    pub Store {}
    impl OrderManagement for Store {
        async fn checkout_cart(&self, user_id: UserId) -> Result<CheckoutResult, FulfillmentError>;
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, FulfillmentError>;
        async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, FulfillmentError>;
        async fn fetch_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, FulfillmentError>;
        async fn advance_order_status(&self, order_id: OrderId, requested: OrderStatusType) -> Result<OrderTransition, FulfillmentError>;
    }
    impl PaymentManagement for Store {
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, FulfillmentError>;
        async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, FulfillmentError>;
        async fn fetch_payment_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, FulfillmentError>;
        async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, FulfillmentError>;
        async fn reconcile_payment_event(&self, event: &PaymentEvent) -> Result<ReconcileOutcome, FulfillmentError>;
        async fn expire_pending_payments(&self, older_than: Duration) -> Result<Vec<Payment>, FulfillmentError>;
    }
    impl CartManagement for Store {
        async fn fetch_cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, FulfillmentError>;
        async fn set_cart_item(&self, user_id: UserId, product_id: ProductId, quantity: i64) -> Result<CartLine, FulfillmentError>;
        async fn remove_cart_item(&self, user_id: UserId, product_id: ProductId) -> Result<bool, FulfillmentError>;
        async fn purge_stale_carts(&self, older_than: Duration, delete_empty: bool) -> Result<CartPurgeResult, FulfillmentError>;
    }
    impl InventoryManagement for Store {
        async fn insert_product(&self, product: NewProduct) -> Result<Product, FulfillmentError>;
        async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, FulfillmentError>;
        async fn try_decrement_stock(&self, product_id: ProductId, quantity: i64) -> Result<StockDecrement, FulfillmentError>;
    }
}

// Canned records for the mocked responses. Timestamps are fixed so that JSON bodies are stable.

pub fn order(id: i64, user_id: UserId, status: OrderStatusType) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap();
    Order { id: OrderId(id), user_id, total: Amount::from(400), status, created_at: ts, updated_at: ts }
}

pub fn order_items(order_id: i64) -> Vec<OrderItem> {
    vec![
        OrderItem {
            id: 1,
            order_id: OrderId(order_id),
            product_name: "Ceramic mug".to_string(),
            price: Amount::from(100),
            quantity: 3,
        },
        OrderItem {
            id: 2,
            order_id: OrderId(order_id),
            product_name: "Coaster".to_string(),
            price: Amount::from(50),
            quantity: 2,
        },
    ]
}

pub fn payment(id: i64, order_id: i64, status: PaymentStatus) -> Payment {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, 35, 0).unwrap();
    Payment {
        id,
        order_id: OrderId(order_id),
        provider: PaymentProvider::Momo,
        amount: Amount::from(400),
        status,
        transaction_id: "TXN9F86D081884C7D65".to_string(),
        provider_assigned: false,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn cart_line(product_id: ProductId, quantity: i64) -> CartLine {
    CartLine {
        cart_id: 1,
        product_id,
        product_name: "Ceramic mug".to_string(),
        price: Amount::from(100),
        stock: 5,
        quantity,
    }
}
