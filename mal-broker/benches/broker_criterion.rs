/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use integration_test_utils::{
    header, int_update, mission_context, RecordingTransport, BROKER_URI, PROVIDER_URI,
};
use mal_broker::{
    Attribute, AttributeType, Broker, BrokerConfig, BrokerHandler, DefaultBrokerHandler,
    InteractionStage, KeyDeclaration, KeyFilter, ProviderIdentity, QosLevel, Subscription,
    SubscriptionFilter, Update, Uri,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

const CONSUMER_COUNTS: [usize; 3] = [10, 100, 1000];
const BATCH_SIZE: i32 = 16;

fn subscriptions_for(consumer: usize) -> Vec<Subscription> {
    let value = (consumer % BATCH_SIZE as usize) as i32;
    vec![
        Subscription::new(
            "EXACT",
            SubscriptionFilter::new(vec![KeyFilter::any_of("K1", vec![Attribute::Integer(value)])]),
        ),
        Subscription::new("ALL", SubscriptionFilter::catch_all()),
    ]
}

fn batch() -> Vec<Update> {
    (0..BATCH_SIZE).map(|key| int_update(key, "payload")).collect()
}

fn bench_match_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_batch");
    let ctx = mission_context();
    let declared = vec![KeyDeclaration::new("K1", AttributeType::Integer)];
    let updates = batch();

    for consumers in CONSUMER_COUNTS {
        let mut handler = DefaultBrokerHandler::default();
        for consumer in 0..consumers {
            handler.add_subscriptions(
                &ctx,
                &Uri::new(format!("maltcp://consumer-{consumer}")),
                subscriptions_for(consumer),
            );
        }

        group.throughput(Throughput::Elements((consumers * updates.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(consumers), &consumers, |b, _| {
            b.iter(|| black_box(handler.match_batch(&ctx, &declared, black_box(&updates))))
        });
    }
    group.finish();
}

fn bench_publish_fanout(c: &mut Criterion) {
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => panic!("unable to start tokio runtime: {err}"),
    };
    let mut group = c.benchmark_group("publish_fanout");
    let ctx = mission_context();

    for consumers in CONSUMER_COUNTS {
        let broker = Broker::new(BrokerConfig::default());
        let transport = Arc::new(RecordingTransport::new());
        runtime.block_on(async {
            let binding = broker
                .create_binding(Uri::from(BROKER_URI), transport.clone())
                .await
                .expect("binding");
            broker
                .handle_publish_register(
                    &header(PROVIDER_URI, &ctx, InteractionStage::PublishRegister),
                    vec![KeyDeclaration::new("K1", AttributeType::Integer)],
                )
                .await
                .expect("publish register");
            for consumer in 0..consumers {
                let address = format!("maltcp://consumer-{consumer}");
                broker
                    .handle_register(
                        &binding,
                        &header(&address, &ctx, InteractionStage::Register),
                        subscriptions_for(consumer),
                    )
                    .await
                    .expect("register");
            }
        });

        let publish_header = header(PROVIDER_URI, &ctx, InteractionStage::Publish);
        group.throughput(Throughput::Elements(consumers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(consumers), &consumers, |b, _| {
            b.iter(|| {
                runtime.block_on(async {
                    let outcome = broker
                        .handle_publish(&publish_header, batch())
                        .await
                        .expect("publish");
                    transport.take();
                    black_box(outcome)
                })
            })
        });
    }
    group.finish();
}

fn bench_provider_registration(c: &mut Criterion) {
    let ctx = mission_context();
    let mut handler = DefaultBrokerHandler::default();
    let provider = ProviderIdentity::new(Uri::from(PROVIDER_URI), &ctx);
    c.bench_function("provider_register_deregister", |b| {
        b.iter(|| {
            handler.register_provider(&ctx, &provider, QosLevel::Assured, vec![]);
            black_box(handler.deregister_provider(&ctx, &provider))
        })
    });
}

criterion_group!(
    benches,
    bench_match_batch,
    bench_publish_fanout,
    bench_provider_registration
);
criterion_main!(benches);
