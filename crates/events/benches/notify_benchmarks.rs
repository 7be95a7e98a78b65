use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ledgerbus_events::{
    HandlerRef, MessageArgs, MessageService, MessageSource, ProcessPoint, PropertyBag,
    ResponseArgs, Sender,
};

fn order_created() -> MessageSource {
    MessageSource::cross_cut("SiconSalesOrder", "Created", ProcessPoint::PostMethod)
        .expect("valid source")
}

fn echo_handler(i: usize) -> HandlerRef {
    HandlerRef::from_fn(format!("echo-{i}"), |_, args| {
        Ok(Some(ResponseArgs::new().with("count", args.properties().len() as i64)))
    })
}

/// Notify latency as the number of subscribed handlers grows.
fn bench_notify_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("notify_fan_out");

    for handler_count in [1usize, 8, 64].iter() {
        let service = MessageService::new();
        for i in 0..*handler_count {
            service
                .subscribe(order_created(), echo_handler(i))
                .expect("subscribe");
        }
        let source = order_created();
        let sender = Sender::bag(PropertyBag::new().with("CourierService", "DHL"));
        let args = MessageArgs::new();

        group.throughput(Throughput::Elements(*handler_count as u64));
        group.bench_with_input(
            BenchmarkId::new("handlers", handler_count),
            handler_count,
            |b, _| b.iter(|| black_box(service.notify(&source, &sender, &args))),
        );
    }

    group.finish();
}

/// Notify against a source with no subscribers (the common publish path).
fn bench_notify_without_subscribers(c: &mut Criterion) {
    let service = MessageService::new();
    service
        .subscribe(MessageSource::well_known("sop.order.saved"), echo_handler(0))
        .expect("subscribe");
    let source = order_created();
    let sender = Sender::bag(PropertyBag::new());
    let args = MessageArgs::new();

    c.bench_function("notify_unsubscribed_source", |b| {
        b.iter(|| black_box(service.notify(&source, &sender, &args)))
    });
}

/// Subscribe followed by unsubscribe of the same handler.
fn bench_subscription_churn(c: &mut Criterion) {
    let service = MessageService::new();
    let source = order_created();
    let handler = echo_handler(0);

    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            service
                .subscribe(source.clone(), handler.clone())
                .expect("subscribe");
            black_box(service.unsubscribe(&source, &handler).expect("unsubscribe"))
        })
    });
}

criterion_group!(
    benches,
    bench_notify_fan_out,
    bench_notify_without_subscribers,
    bench_subscription_churn
);
criterion_main!(benches);
